//! Physique analysis service
//!
//! Runs one analysis request end to end: validates input, extracts features,
//! scores the physique, and then either establishes the user's baseline or
//! records progression against it. Female and non-binary requests get the
//! placeholder result and are not stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::composition::{generate_diet_plan, generate_workout_routine, DietPlan, PlanInput, WorkoutRoutine};
use crate::config::AnalysisConfig;
use crate::error::{PhysiqueError, Result};
use crate::features::{extract_body_features, BodyFeatures};
use crate::logging::OperationTimer;
use crate::metrics::{AnalysisKind, MetricsCollector, MetricsTimer};
use crate::models::{Gender, Landmark, NewScan, NewUser, PhysiqueAnalysis, ProgressionRecord, Scan, ScoringOutcome};
use crate::progression::{days_since_baseline, ScoreDeltas};
use crate::repository::ScanRepository;
use crate::scoring::score_physique;
use crate::validation::InputValidator;

/// Message returned with a user's first scan
pub const BASELINE_MESSAGE: &str = "Great! This is your baseline scan. Future scans will show your progress.";

/// One analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// 33 front-view landmarks
    pub front_pose: Vec<Landmark>,
    /// 33 side-view landmarks, or empty
    #[serde(default)]
    pub side_pose: Vec<Landmark>,
    /// Selects the scoring model
    pub gender: Gender,
    /// Optional height in centimeters
    #[serde(default)]
    pub height_cm: Option<f64>,
    /// Explicit user; defaults to the per-gender demo identity
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Baseline or progress information attached to a stored scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStatus {
    /// True when this scan became the user's baseline
    pub is_baseline: bool,
    /// Set on the baseline scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whole days since the baseline scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_since_baseline: Option<i64>,
    /// Overall score minus the baseline's overall score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_change: Option<i32>,
    /// Per-category deltas against the baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deltas: Option<ScoreDeltas>,
}

impl ProgressStatus {
    fn baseline() -> Self {
        Self {
            is_baseline: true,
            message: Some(BASELINE_MESSAGE.to_string()),
            days_since_baseline: None,
            score_change: None,
            deltas: None,
        }
    }

    const fn progress(days_since_baseline: i64, deltas: ScoreDeltas) -> Self {
        Self {
            is_baseline: false,
            message: None,
            days_since_baseline: Some(days_since_baseline),
            score_change: Some(deltas.overall),
            deltas: Some(deltas),
        }
    }
}

/// Everything one analysis produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// User the scan was recorded for
    pub user_id: String,
    /// Stored scan id; `None` when nothing was stored
    pub scan_id: Option<i64>,
    /// Scorer output or the unsupported placeholder
    pub physique: ScoringOutcome,
    /// Baseline/progress status; `None` when nothing was stored
    #[serde(flatten)]
    pub progress: Option<ProgressStatus>,
    /// Feature bundle consumed by pathway generation
    pub features: BodyFeatures,
    /// Diet plan derived from the physique score
    pub diet_plan: Option<DietPlan>,
    /// Workout routine derived from the physique score
    pub workout_routine: Option<WorkoutRoutine>,
}

/// Analysis protocol over an injected scan store
pub struct PhysiqueService {
    repository: Box<dyn ScanRepository>,
    config: AnalysisConfig,
    metrics: MetricsCollector,
}

impl std::fmt::Debug for PhysiqueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysiqueService")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl PhysiqueService {
    /// Create a service over `repository`
    #[must_use]
    pub fn new(repository: Box<dyn ScanRepository>, config: AnalysisConfig) -> Self {
        Self {
            repository,
            config,
            metrics: MetricsCollector::default(),
        }
    }

    /// Metrics recorded by this service
    #[must_use]
    pub const fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// The underlying store
    #[must_use]
    pub fn repository(&self) -> &dyn ScanRepository {
        self.repository.as_ref()
    }

    /// User a request is recorded under
    #[must_use]
    pub fn resolve_user_id(&self, request: &AnalyzeRequest) -> String {
        request
            .user_id
            .clone()
            .unwrap_or_else(|| self.config.demo_user_id(request.gender))
    }

    /// Analyze a request, timestamping the scan now
    pub fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisReport> {
        self.analyze_at(request, Utc::now())
    }

    /// Analyze a request as if it arrived at `now`
    pub fn analyze_at(&self, request: &AnalyzeRequest, now: DateTime<Utc>) -> Result<AnalysisReport> {
        let timer = OperationTimer::new("analyze_physique");
        let result = self.run_analysis(request, now);

        match &result {
            Ok(report) => {
                let kind = match &report.progress {
                    Some(status) if status.is_baseline => AnalysisKind::Baseline,
                    Some(_) => AnalysisKind::Progress,
                    None => AnalysisKind::Unsupported,
                };
                let overall = report.physique.analysis().map(|a| a.overall_score);
                self.metrics
                    .record_analysis(request.gender, kind, overall, timer.elapsed());
            }
            Err(err) => {
                let error_type = if err.is_client_error() {
                    "validation"
                } else if err.is_conflict() {
                    "conflict"
                } else {
                    "internal"
                };
                warn!(error = %err, error_type, "Physique analysis failed");
                self.metrics.record_error(error_type, "analyze_physique");
            }
        }

        timer.finish();
        result
    }

    fn run_analysis(&self, request: &AnalyzeRequest, now: DateTime<Utc>) -> Result<AnalysisReport> {
        let user_id = self.resolve_user_id(request);
        InputValidator::validate_user_id(&user_id)?;
        InputValidator::validate_height(request.height_cm)?;
        debug!(
            user_id = %user_id,
            gender = %request.gender,
            front = request.front_pose.len(),
            side = request.side_pose.len(),
            "Analyzing physique"
        );

        let features = extract_body_features(&request.front_pose, &request.side_pose, request.gender);
        if features.is_fallback() {
            self.metrics.record_fallback("features");
        }

        if request.gender == Gender::Male {
            InputValidator::validate_pose(&request.front_pose, "front")?;
            InputValidator::validate_side_pose(&request.side_pose)?;
        }

        let physique = score_physique(request.gender, &request.front_pose, &request.side_pose, request.height_cm)?;

        let (scan_id, progress) = match physique.analysis() {
            Some(analysis) => {
                let (scan_id, status) = self.record_scan(&user_id, request, analysis, now)?;
                (Some(scan_id), Some(status))
            }
            None => {
                info!(user_id = %user_id, gender = %request.gender, "No scoring model for gender, scan not stored");
                (None, None)
            }
        };

        let plan = if self.config.include_plans {
            PlanInput::from_physique(&physique)
        } else {
            None
        };

        Ok(AnalysisReport {
            user_id,
            scan_id,
            diet_plan: plan.as_ref().map(generate_diet_plan),
            workout_routine: plan.as_ref().map(generate_workout_routine),
            physique,
            progress,
            features,
        })
    }

    /// Store a scored scan as the baseline or as progress against it
    fn record_scan(
        &self,
        user_id: &str,
        request: &AnalyzeRequest,
        analysis: &PhysiqueAnalysis,
        now: DateTime<Utc>,
    ) -> Result<(i64, ProgressStatus)> {
        let user = NewUser {
            user_id: user_id.to_string(),
            gender: request.gender,
            height_cm: request.height_cm,
        };
        if self.store("create_user", |repo| repo.create_user(&user))? {
            info!(user_id, "Created user");
        }

        let baseline = self.store("get_baseline_scan", |repo| repo.get_baseline_scan(user_id))?;
        let scan = NewScan {
            user_id: user_id.to_string(),
            scan_date: now,
            front_pose: request.front_pose.clone(),
            side_pose: request.side_pose.clone(),
            analysis: analysis.clone(),
        };

        let Some(baseline) = baseline else {
            let scan_id = self.store("establish_baseline", |repo| repo.establish_baseline(&scan))?;
            info!(user_id, scan_id, overall = analysis.overall_score, "Baseline scan recorded");
            return Ok((scan_id, ProgressStatus::baseline()));
        };

        let scan_id = self.store("save_scan", |repo| repo.save_scan(&scan, false))?;
        let days = days_since_baseline(baseline.scan_date, now);
        self.store("save_progression", |repo| {
            repo.save_progression(user_id, scan_id, &analysis.scores, &baseline.scores, days)
        })?;

        let mut deltas = ScoreDeltas::between(&analysis.scores, &baseline.scores);
        // Older stored scans may lack the overall key; the column is authoritative
        deltas.overall = analysis.overall_score - baseline.overall_score;

        info!(
            user_id,
            scan_id,
            days_since_baseline = days,
            score_change = deltas.overall,
            "Progression recorded"
        );
        Ok((scan_id, ProgressStatus::progress(days, deltas)))
    }

    /// Scans for a user, newest first; `limit` defaults to the configured history size
    ///
    /// Fails with `NotFound` for a user that has never been stored.
    pub fn scan_history(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Scan>> {
        self.require_user(user_id)?;
        let limit = limit.unwrap_or(self.config.history_limit);
        self.store("get_user_scans", |repo| repo.get_user_scans(user_id, limit))
    }

    /// Progression rows for a user, earliest first
    ///
    /// Fails with `NotFound` for a user that has never been stored.
    pub fn progression_history(&self, user_id: &str) -> Result<Vec<ProgressionRecord>> {
        self.require_user(user_id)?;
        self.store("get_progression_history", |repo| repo.get_progression_history(user_id))
    }

    fn require_user(&self, user_id: &str) -> Result<()> {
        match self.store("get_user", |repo| repo.get_user(user_id))? {
            Some(_) => Ok(()),
            None => Err(PhysiqueError::NotFound(format!("User not found: {user_id}"))),
        }
    }

    fn store<T>(&self, operation: &'static str, call: impl FnOnce(&dyn ScanRepository) -> Result<T>) -> Result<T> {
        let timer = MetricsTimer::new(&self.metrics, operation);
        let result = call(self.repository.as_ref());
        // A baseline conflict is a protocol outcome, not a store failure
        timer.finish(result.is_ok() || matches!(&result, Err(PhysiqueError::BaselineConflict { .. })));
        result
    }
}
