//! Scan store contract and an in-process implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{PhysiqueError, Result};
use crate::models::{
    BaselineMetrics, Landmark, NewScan, NewUser, ProgressionRecord, Scan, ScoreSet, User,
};
use crate::progression::{BaselineProportions, ScoreDeltas};

/// Persistence contract for users, scans, baselines and progression rows.
///
/// Implemented by [`MemoryScanRepository`] for tests and by
/// [`crate::db::Database`] for SQLite.
#[cfg_attr(test, mockall::automock)]
pub trait ScanRepository: Send + Sync {
    /// Create a user; returns `false` without touching the stored row if it already exists
    fn create_user(&self, user: &NewUser) -> Result<bool>;

    /// Look up a user
    fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// The user's baseline scan, if one was recorded
    fn get_baseline_scan(&self, user_id: &str) -> Result<Option<Scan>>;

    /// Append a scan and return its id; never overwrites
    fn save_scan(&self, scan: &NewScan, is_baseline: bool) -> Result<i64>;

    /// Compute baseline proportions from `front` and upsert the user's single row
    fn save_baseline_metrics(&self, user_id: &str, baseline_scan_id: i64, front: &[Landmark]) -> Result<()>;

    /// Atomically record `scan` as the user's baseline together with its metrics.
    ///
    /// Fails with [`PhysiqueError::BaselineConflict`] if the user already has one.
    fn establish_baseline(&self, scan: &NewScan) -> Result<i64>;

    /// Append a progression row with `current - baseline` deltas and return its id
    fn save_progression(
        &self,
        user_id: &str,
        scan_id: i64,
        current: &ScoreSet,
        baseline: &ScoreSet,
        days_since_baseline: i64,
    ) -> Result<i64>;

    /// Most recent scans first
    fn get_user_scans(&self, user_id: &str, limit: usize) -> Result<Vec<Scan>>;

    /// Progression rows ordered by `days_since_baseline`
    fn get_progression_history(&self, user_id: &str) -> Result<Vec<ProgressionRecord>>;

    /// The user's baseline metrics row
    fn get_baseline_metrics(&self, user_id: &str) -> Result<Option<BaselineMetrics>>;
}

/// Build a stored scan from its insert payload
pub(crate) fn scan_from_new(scan_id: i64, scan: &NewScan, is_baseline: bool) -> Scan {
    Scan {
        scan_id,
        user_id: scan.user_id.clone(),
        scan_date: scan.scan_date,
        is_baseline,
        front_pose: scan.front_pose.clone(),
        side_pose: scan.side_pose.clone(),
        overall_score: scan.analysis.overall_score,
        scores: scan.analysis.scores,
        body_type: Some(scan.analysis.body_type.clone()),
        frame: Some(scan.analysis.frame.clone()),
        strong_areas: scan.analysis.strong_areas.clone(),
        growth_areas: scan.analysis.growth_areas.clone(),
        key_insight: Some(scan.analysis.key_insight.clone()),
    }
}

#[derive(Debug, Clone)]
struct ProgressionRow {
    progression_id: i64,
    user_id: String,
    scan_id: i64,
    days_since_baseline: i64,
    deltas: ScoreDeltas,
    created_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    scans: Vec<Scan>,
    baselines: HashMap<String, BaselineMetrics>,
    progression: Vec<ProgressionRow>,
    next_scan_id: i64,
    next_progression_id: i64,
}

impl MemoryState {
    fn insert_scan(&mut self, scan: &NewScan, is_baseline: bool) -> i64 {
        self.next_scan_id += 1;
        let scan_id = self.next_scan_id;
        self.scans.push(scan_from_new(scan_id, scan, is_baseline));
        scan_id
    }

    fn has_baseline(&self, user_id: &str) -> bool {
        self.baselines.contains_key(user_id)
            || self.scans.iter().any(|s| s.user_id == user_id && s.is_baseline)
    }
}

/// In-process store backed by hash maps, one lock for all tables
#[derive(Debug, Default)]
pub struct MemoryScanRepository {
    state: Mutex<MemoryState>,
}

impl MemoryScanRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| PhysiqueError::Other("scan repository lock poisoned".to_string()))
    }
}

impl ScanRepository for MemoryScanRepository {
    fn create_user(&self, user: &NewUser) -> Result<bool> {
        let mut state = self.lock()?;
        if state.users.contains_key(&user.user_id) {
            debug!(user_id = %user.user_id, "User already exists");
            return Ok(false);
        }

        let now = Utc::now();
        state.users.insert(
            user.user_id.clone(),
            User {
                user_id: user.user_id.clone(),
                gender: user.gender,
                height_cm: user.height_cm,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(true)
    }

    fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    fn get_baseline_scan(&self, user_id: &str) -> Result<Option<Scan>> {
        let state = self.lock()?;
        Ok(state
            .scans
            .iter()
            .filter(|s| s.user_id == user_id && s.is_baseline)
            .min_by_key(|s| (s.scan_date, s.scan_id))
            .cloned())
    }

    fn save_scan(&self, scan: &NewScan, is_baseline: bool) -> Result<i64> {
        Ok(self.lock()?.insert_scan(scan, is_baseline))
    }

    fn save_baseline_metrics(&self, user_id: &str, baseline_scan_id: i64, front: &[Landmark]) -> Result<()> {
        let proportions = BaselineProportions::from_front(front)?;
        let mut state = self.lock()?;
        state.baselines.insert(
            user_id.to_string(),
            BaselineMetrics {
                user_id: user_id.to_string(),
                baseline_scan_id,
                proportions,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn establish_baseline(&self, scan: &NewScan) -> Result<i64> {
        let proportions = BaselineProportions::from_front(&scan.front_pose)?;

        // Held across check and insert
        let mut state = self.lock()?;
        if state.has_baseline(&scan.user_id) {
            return Err(PhysiqueError::BaselineConflict {
                user_id: scan.user_id.clone(),
            });
        }

        let scan_id = state.insert_scan(scan, true);
        state.baselines.insert(
            scan.user_id.clone(),
            BaselineMetrics {
                user_id: scan.user_id.clone(),
                baseline_scan_id: scan_id,
                proportions,
                created_at: Utc::now(),
            },
        );
        info!(user_id = %scan.user_id, scan_id, "Baseline established");
        Ok(scan_id)
    }

    fn save_progression(
        &self,
        user_id: &str,
        scan_id: i64,
        current: &ScoreSet,
        baseline: &ScoreSet,
        days_since_baseline: i64,
    ) -> Result<i64> {
        let mut state = self.lock()?;
        state.next_progression_id += 1;
        let progression_id = state.next_progression_id;
        state.progression.push(ProgressionRow {
            progression_id,
            user_id: user_id.to_string(),
            scan_id,
            days_since_baseline,
            deltas: ScoreDeltas::between(current, baseline),
            created_at: Utc::now(),
        });
        Ok(progression_id)
    }

    fn get_user_scans(&self, user_id: &str, limit: usize) -> Result<Vec<Scan>> {
        let state = self.lock()?;
        let mut scans: Vec<Scan> = state.scans.iter().filter(|s| s.user_id == user_id).cloned().collect();
        scans.sort_by(|a, b| b.scan_date.cmp(&a.scan_date).then(b.scan_id.cmp(&a.scan_id)));
        scans.truncate(limit);
        Ok(scans)
    }

    fn get_progression_history(&self, user_id: &str) -> Result<Vec<ProgressionRecord>> {
        let state = self.lock()?;
        let mut records: Vec<ProgressionRecord> = state
            .progression
            .iter()
            .filter(|row| row.user_id == user_id)
            .filter_map(|row| {
                // Rows whose scan is gone drop out, like an inner join
                let scan = state.scans.iter().find(|s| s.scan_id == row.scan_id)?;
                Some(ProgressionRecord {
                    progression_id: row.progression_id,
                    user_id: row.user_id.clone(),
                    scan_id: row.scan_id,
                    days_since_baseline: row.days_since_baseline,
                    deltas: row.deltas,
                    notes: None,
                    created_at: row.created_at,
                    scan_date: scan.scan_date,
                    overall_score: scan.overall_score,
                })
            })
            .collect();
        records.sort_by_key(|r| (r.days_since_baseline, r.progression_id));
        Ok(records)
    }

    fn get_baseline_metrics(&self, user_id: &str) -> Result<Option<BaselineMetrics>> {
        Ok(self.lock()?.baselines.get(user_id).cloned())
    }
}
