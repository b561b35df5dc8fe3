use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use metrics::{counter, gauge, histogram};

use crate::models::Gender;

/// Metrics collection and management
///
/// Emits through the `metrics` facade (a no-op until a recorder is installed)
/// and keeps local tallies so callers can report totals without one.
#[derive(Debug)]
pub struct MetricsCollector {
    // Analysis metrics
    pub analyses_total: &'static str,
    pub analysis_duration: &'static str,
    pub overall_score: &'static str,

    // Store metrics
    pub store_operations_total: &'static str,
    pub store_operation_duration: &'static str,

    // Extractor metrics
    pub feature_fallbacks_total: &'static str,

    // Error metrics
    pub errors_total: &'static str,

    tallies: Tallies,
}

#[derive(Debug, Default)]
struct Tallies {
    analyses: AtomicU64,
    baselines: AtomicU64,
    progressions: AtomicU64,
    store_operations: AtomicU64,
    fallbacks: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of the local tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Analyses run, any outcome
    pub analyses: u64,
    /// Analyses that established a baseline
    pub baselines: u64,
    /// Analyses that recorded progression
    pub progressions: u64,
    /// Store calls
    pub store_operations: u64,
    /// Feature extractions that fell back to defaults
    pub fallbacks: u64,
    /// Errors of any kind
    pub errors: u64,
}

/// How an analysis request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    /// First scan, stored as the baseline
    Baseline,
    /// Later scan, compared to the baseline
    Progress,
    /// Gender without a scoring model; nothing stored
    Unsupported,
}

impl AnalysisKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Progress => "progress",
            Self::Unsupported => "unsupported",
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            analyses_total: "physique_analyses_total",
            analysis_duration: "physique_analysis_duration_seconds",
            overall_score: "physique_overall_score",

            store_operations_total: "physique_store_operations_total",
            store_operation_duration: "physique_store_operation_duration_seconds",

            feature_fallbacks_total: "physique_feature_fallbacks_total",

            errors_total: "physique_errors_total",

            tallies: Tallies::default(),
        }
    }
}

impl MetricsCollector {
    /// Install the no-op global recorder
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {}", e))?;

        Ok(())
    }

    /// Record a finished analysis and, when scored, its overall score
    pub fn record_analysis(&self, gender: Gender, kind: AnalysisKind, overall: Option<i32>, duration: Duration) {
        counter!(self.analyses_total, "gender" => gender.as_str(), "kind" => kind.label()).increment(1);
        histogram!(self.analysis_duration, "kind" => kind.label()).record(duration.as_secs_f64());
        if let Some(score) = overall {
            gauge!(self.overall_score, "gender" => gender.as_str()).set(f64::from(score));
        }

        self.tallies.analyses.fetch_add(1, Ordering::Relaxed);
        match kind {
            AnalysisKind::Baseline => {
                self.tallies.baselines.fetch_add(1, Ordering::Relaxed);
            }
            AnalysisKind::Progress => {
                self.tallies.progressions.fetch_add(1, Ordering::Relaxed);
            }
            AnalysisKind::Unsupported => {}
        }
    }

    /// Record a store call
    pub fn record_store_operation(&self, operation: &'static str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };
        counter!(self.store_operations_total, "operation" => operation, "status" => status).increment(1);
        histogram!(self.store_operation_duration, "operation" => operation).record(duration.as_secs_f64());
        self.tallies.store_operations.fetch_add(1, Ordering::Relaxed);

        if !success {
            self.record_error("store", operation);
        }
    }

    /// Record a feature extraction that fell back to the default bundle
    pub fn record_fallback(&self, component: &'static str) {
        counter!(self.feature_fallbacks_total, "component" => component).increment(1);
        self.tallies.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        counter!(self.errors_total, "type" => error_type, "operation" => operation).increment(1);
        self.tallies.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Current local tallies
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            analyses: self.tallies.analyses.load(Ordering::Relaxed),
            baselines: self.tallies.baselines.load(Ordering::Relaxed),
            progressions: self.tallies.progressions.load(Ordering::Relaxed),
            store_operations: self.tallies.store_operations.load(Ordering::Relaxed),
            fallbacks: self.tallies.fallbacks.load(Ordering::Relaxed),
            errors: self.tallies.errors.load(Ordering::Relaxed),
        }
    }
}

/// Times one store call and reports it on [`MetricsTimer::finish`]
#[derive(Debug)]
pub struct MetricsTimer<'a> {
    collector: &'a MetricsCollector,
    operation: &'static str,
    start: Instant,
}

impl<'a> MetricsTimer<'a> {
    /// Start timing `operation`
    #[must_use]
    pub fn new(collector: &'a MetricsCollector, operation: &'static str) -> Self {
        Self {
            collector,
            operation,
            start: Instant::now(),
        }
    }

    /// Report the elapsed time and outcome
    pub fn finish(self, success: bool) {
        self.collector
            .record_store_operation(self.operation, self.start.elapsed(), success);
    }
}
