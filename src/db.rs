//! SQLite scan store
//!
//! Pooled rusqlite connections with embedded migrations, busy retries and an
//! atomic baseline insert.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{PhysiqueError, Result};
use crate::logging::OperationTimer;
use crate::models::{BaselineMetrics, Gender, Landmark, NewScan, NewUser, ProgressionRecord, Scan, ScoreSet, User};
use crate::progression::{BaselineProportions, ScoreDeltas};
use crate::repository::ScanRepository;
use crate::schema::{baseline_metrics, progression, scans, users};

/// Pool of SQLite connections
pub type DbPool = Pool<SqliteConnectionManager>;
/// Connection checked out of a [`DbPool`]
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const IN_MEMORY: &str = ":memory:";

/// SQLite-backed scan store
pub struct Database {
    pool: DbPool,
    max_retries: u32,
    retry_backoff: Duration,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool_size", &self.pool.max_size())
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database at `database_url` with default pool settings
    pub fn new(database_url: &str) -> Result<Self> {
        Self::from_config(&DatabaseConfig {
            url: database_url.to_string(),
            ..DatabaseConfig::default()
        })
    }

    /// Open the database described by `config` and run migrations
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let path = strip_url_scheme(&config.url);
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

        let (manager, max_size) = if path == IN_MEMORY {
            // Every pooled connection would get its own private database
            (SqliteConnectionManager::memory(), 1)
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            (SqliteConnectionManager::file(path), config.max_connections)
        };

        let manager = manager.with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "foreign_keys", "ON")
        });

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;
        info!(path, pool_size = max_size, "Database ready");

        Ok(Self {
            pool,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/2025-01-10-000000_create_tables/up.sql"))?;
        debug!("Migrations applied");
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Run `operation`, retrying with linear backoff while SQLite reports busy/locked
    fn with_retry<T>(&self, name: &'static str, mut operation: impl FnMut(&mut Connection) -> Result<T>) -> Result<T> {
        let _timer = OperationTimer::new(name);
        let mut attempt = 0;
        loop {
            let mut conn = self.get_connection()?;
            match operation(&mut conn) {
                Err(PhysiqueError::Database(err)) if is_busy(&err) && attempt < self.max_retries => {
                    drop(conn);
                    attempt += 1;
                    warn!(operation = name, attempt, error = %err, "Database busy, retrying");
                    std::thread::sleep(self.retry_backoff * attempt);
                }
                Err(err) => {
                    if !err.is_conflict() {
                        error!(operation = name, error = %err, "Database operation failed");
                    }
                    return Err(err);
                }
                ok => return ok,
            }
        }
    }

    fn insert_scan(conn: &Connection, scan: &NewScan, is_baseline: bool) -> Result<i64> {
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                scans::TABLE,
                scans::USER_ID,
                scans::SCAN_DATE,
                scans::IS_BASELINE,
                scans::FRONT_POSE_DATA,
                scans::SIDE_POSE_DATA,
                scans::OVERALL_SCORE,
                scans::SCORES_JSON,
                scans::BODY_TYPE,
                scans::FRAME,
                scans::STRONG_AREAS_JSON,
                scans::GROWTH_AREAS_JSON,
                scans::KEY_INSIGHT,
            ),
            params![
                scan.user_id,
                format_timestamp(scan.scan_date),
                is_baseline,
                serde_json::to_string(&scan.front_pose)?,
                serde_json::to_string(&scan.side_pose)?,
                scan.analysis.overall_score,
                serde_json::to_string(&scan.analysis.scores)?,
                scan.analysis.body_type,
                scan.analysis.frame,
                serde_json::to_string(&scan.analysis.strong_areas)?,
                serde_json::to_string(&scan.analysis.growth_areas)?,
                scan.analysis.key_insight,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_baseline_metrics(
        conn: &Connection,
        verb: &str,
        user_id: &str,
        baseline_scan_id: i64,
        proportions: &BaselineProportions,
    ) -> Result<()> {
        conn.execute(
            &format!(
                "{verb} INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                baseline_metrics::TABLE,
                baseline_metrics::USER_ID,
                baseline_metrics::BASELINE_SCAN_ID,
                baseline_metrics::SHOULDER_HIP_RATIO,
                baseline_metrics::WAIST_SHOULDER_RATIO,
                baseline_metrics::ARM_LEG_RATIO,
                baseline_metrics::SHOULDER_WIDTH_NORMALIZED,
                baseline_metrics::HIP_WIDTH_NORMALIZED,
                baseline_metrics::CREATED_AT,
            ),
            params![
                user_id,
                baseline_scan_id,
                proportions.shoulder_hip_ratio,
                proportions.waist_shoulder_ratio,
                proportions.arm_leg_ratio,
                proportions.shoulder_width_normalized,
                proportions.hip_width_normalized,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Map a database row to a User
    fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            user_id: row.get(users::USER_ID)?,
            gender: get_parsed::<Gender>(row, users::GENDER)?,
            height_cm: row.get(users::HEIGHT_CM)?,
            created_at: get_timestamp(row, users::CREATED_AT)?,
            updated_at: get_timestamp(row, users::UPDATED_AT)?,
        })
    }

    /// Map a database row to a Scan
    fn map_scan(row: &Row<'_>) -> rusqlite::Result<Scan> {
        Ok(Scan {
            scan_id: row.get(scans::SCAN_ID)?,
            user_id: row.get(scans::USER_ID)?,
            scan_date: get_timestamp(row, scans::SCAN_DATE)?,
            is_baseline: row.get(scans::IS_BASELINE)?,
            front_pose: get_json::<Vec<Landmark>>(row, scans::FRONT_POSE_DATA)?,
            side_pose: get_json::<Vec<Landmark>>(row, scans::SIDE_POSE_DATA)?,
            overall_score: row.get(scans::OVERALL_SCORE)?,
            scores: get_json::<ScoreSet>(row, scans::SCORES_JSON)?,
            body_type: row.get(scans::BODY_TYPE)?,
            frame: row.get(scans::FRAME)?,
            strong_areas: get_json(row, scans::STRONG_AREAS_JSON)?,
            growth_areas: get_json(row, scans::GROWTH_AREAS_JSON)?,
            key_insight: row.get(scans::KEY_INSIGHT)?,
        })
    }

    /// Map a database row to BaselineMetrics
    fn map_baseline_metrics(row: &Row<'_>) -> rusqlite::Result<BaselineMetrics> {
        Ok(BaselineMetrics {
            user_id: row.get(baseline_metrics::USER_ID)?,
            baseline_scan_id: row.get(baseline_metrics::BASELINE_SCAN_ID)?,
            proportions: BaselineProportions {
                shoulder_hip_ratio: row.get(baseline_metrics::SHOULDER_HIP_RATIO)?,
                waist_shoulder_ratio: row.get(baseline_metrics::WAIST_SHOULDER_RATIO)?,
                arm_leg_ratio: row.get(baseline_metrics::ARM_LEG_RATIO)?,
                shoulder_width_normalized: row.get(baseline_metrics::SHOULDER_WIDTH_NORMALIZED)?,
                hip_width_normalized: row.get(baseline_metrics::HIP_WIDTH_NORMALIZED)?,
            },
            created_at: get_timestamp(row, baseline_metrics::CREATED_AT)?,
        })
    }

    /// Map a progression row joined with its scan
    fn map_progression(row: &Row<'_>) -> rusqlite::Result<ProgressionRecord> {
        Ok(ProgressionRecord {
            progression_id: row.get(progression::PROGRESSION_ID)?,
            user_id: row.get(progression::USER_ID)?,
            scan_id: row.get(progression::SCAN_ID)?,
            days_since_baseline: row.get(progression::DAYS_SINCE_BASELINE)?,
            deltas: ScoreDeltas {
                overall: row.get(progression::OVERALL_SCORE_DELTA)?,
                shoulders: row.get(progression::SHOULDER_SCORE_DELTA)?,
                chest: row.get(progression::CHEST_SCORE_DELTA)?,
                core: row.get(progression::CORE_SCORE_DELTA)?,
                v_taper: row.get(progression::V_TAPER_SCORE_DELTA)?,
                symmetry: row.get(progression::SYMMETRY_SCORE_DELTA)?,
                posture: row.get(progression::POSTURE_SCORE_DELTA)?,
                arms: row.get(progression::ARMS_SCORE_DELTA)?,
            },
            notes: row.get(progression::NOTES)?,
            created_at: get_timestamp(row, progression::CREATED_AT)?,
            scan_date: get_timestamp(row, scans::SCAN_DATE)?,
            overall_score: row.get(scans::OVERALL_SCORE)?,
        })
    }
}

impl ScanRepository for Database {
    fn create_user(&self, user: &NewUser) -> Result<bool> {
        self.with_retry("create_user", |conn| {
            let now = format_timestamp(Utc::now());
            let inserted = conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} ({}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
                    users::TABLE,
                    users::USER_ID,
                    users::GENDER,
                    users::HEIGHT_CM,
                    users::CREATED_AT,
                    users::UPDATED_AT,
                ),
                params![user.user_id, user.gender.as_str(), user.height_cm, now, now],
            )?;
            Ok(inserted > 0)
        })
    }

    fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.with_retry("get_user", |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT * FROM {} WHERE {} = ?1", users::TABLE, users::USER_ID),
                    params![user_id],
                    Self::map_user,
                )
                .optional()?)
        })
    }

    fn get_baseline_scan(&self, user_id: &str) -> Result<Option<Scan>> {
        self.with_retry("get_baseline_scan", |conn| {
            Ok(conn
                .query_row(
                    "SELECT * FROM scans WHERE user_id = ?1 AND is_baseline = 1 \
                     ORDER BY scan_date ASC, scan_id ASC LIMIT 1",
                    params![user_id],
                    Self::map_scan,
                )
                .optional()?)
        })
    }

    fn save_scan(&self, scan: &NewScan, is_baseline: bool) -> Result<i64> {
        self.with_retry("save_scan", |conn| Self::insert_scan(conn, scan, is_baseline))
    }

    fn save_baseline_metrics(&self, user_id: &str, baseline_scan_id: i64, front: &[Landmark]) -> Result<()> {
        let proportions = BaselineProportions::from_front(front)?;
        self.with_retry("save_baseline_metrics", |conn| {
            Self::insert_baseline_metrics(conn, "INSERT OR REPLACE", user_id, baseline_scan_id, &proportions)
        })
    }

    fn establish_baseline(&self, scan: &NewScan) -> Result<i64> {
        let proportions = BaselineProportions::from_front(&scan.front_pose)?;
        let conflict = || PhysiqueError::BaselineConflict {
            user_id: scan.user_id.clone(),
        };

        self.with_retry("establish_baseline", |conn| {
            // IMMEDIATE takes the write lock before the existence check
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM baseline_metrics WHERE user_id = ?1) \
                 OR EXISTS(SELECT 1 FROM scans WHERE user_id = ?1 AND is_baseline = 1)",
                params![scan.user_id],
                |row| row.get(0),
            )?;
            if exists {
                return Err(conflict());
            }

            let scan_id = Self::insert_scan(&tx, scan, true)?;
            Self::insert_baseline_metrics(&tx, "INSERT", &scan.user_id, scan_id, &proportions).map_err(|err| {
                if matches!(&err, PhysiqueError::Database(db_err) if is_constraint_violation(db_err)) {
                    conflict()
                } else {
                    err
                }
            })?;
            tx.commit()?;

            info!(user_id = %scan.user_id, scan_id, "Baseline established");
            Ok(scan_id)
        })
    }

    fn save_progression(
        &self,
        user_id: &str,
        scan_id: i64,
        current: &ScoreSet,
        baseline: &ScoreSet,
        days_since_baseline: i64,
    ) -> Result<i64> {
        let deltas = ScoreDeltas::between(current, baseline);
        self.with_retry("save_progression", |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    progression::TABLE,
                    progression::USER_ID,
                    progression::SCAN_ID,
                    progression::DAYS_SINCE_BASELINE,
                    progression::OVERALL_SCORE_DELTA,
                    progression::SHOULDER_SCORE_DELTA,
                    progression::CHEST_SCORE_DELTA,
                    progression::CORE_SCORE_DELTA,
                    progression::V_TAPER_SCORE_DELTA,
                    progression::SYMMETRY_SCORE_DELTA,
                    progression::POSTURE_SCORE_DELTA,
                    progression::ARMS_SCORE_DELTA,
                    progression::CREATED_AT,
                ),
                params![
                    user_id,
                    scan_id,
                    days_since_baseline,
                    deltas.overall,
                    deltas.shoulders,
                    deltas.chest,
                    deltas.core,
                    deltas.v_taper,
                    deltas.symmetry,
                    deltas.posture,
                    deltas.arms,
                    format_timestamp(Utc::now()),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn get_user_scans(&self, user_id: &str, limit: usize) -> Result<Vec<Scan>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_retry("get_user_scans", |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM scans WHERE user_id = ?1 ORDER BY scan_date DESC, scan_id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit], Self::map_scan)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn get_progression_history(&self, user_id: &str) -> Result<Vec<ProgressionRecord>> {
        self.with_retry("get_progression_history", |conn| {
            let mut stmt = conn.prepare(
                "SELECT p.*, s.scan_date, s.overall_score FROM progression p \
                 JOIN scans s ON p.scan_id = s.scan_id \
                 WHERE p.user_id = ?1 \
                 ORDER BY p.days_since_baseline ASC, p.progression_id ASC",
            )?;
            let rows = stmt.query_map(params![user_id], Self::map_progression)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn get_baseline_metrics(&self, user_id: &str) -> Result<Option<BaselineMetrics>> {
        self.with_retry("get_baseline_metrics", |conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT * FROM {} WHERE {} = ?1",
                        baseline_metrics::TABLE,
                        baseline_metrics::USER_ID
                    ),
                    params![user_id],
                    Self::map_baseline_metrics,
                )
                .optional()?)
        })
    }
}

/// `sqlite://path`, `sqlite:path` and bare paths all name the same file
fn strip_url_scheme(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
}

/// Fixed-width UTC timestamps so text ordering matches time ordering
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    row: &Row<'_>,
    column: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn get_timestamp(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, column, e))
}

fn get_json<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(row, column, e))
}

fn get_parsed<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e| conversion_error(row, column, e))
}
