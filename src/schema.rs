//! Database schema definitions
//!
//! Table and column names used with rusqlite. The layout must stay compatible
//! with existing physique databases, so names here are never renamed.

/// Users table schema
pub mod users {
    /// Table name
    pub const TABLE: &str = "users";
    /// Primary key column
    pub const USER_ID: &str = "user_id";
    /// Gender column
    pub const GENDER: &str = "gender";
    /// Height in centimeters column
    pub const HEIGHT_CM: &str = "height_cm";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
    /// Update timestamp column
    pub const UPDATED_AT: &str = "updated_at";
}

/// Scans table schema
pub mod scans {
    /// Table name
    pub const TABLE: &str = "scans";
    /// Primary key column
    pub const SCAN_ID: &str = "scan_id";
    /// Foreign key to users table
    pub const USER_ID: &str = "user_id";
    /// Scan timestamp column
    pub const SCAN_DATE: &str = "scan_date";
    /// Baseline flag column
    pub const IS_BASELINE: &str = "is_baseline";
    /// Front landmarks JSON column
    pub const FRONT_POSE_DATA: &str = "front_pose_data";
    /// Side landmarks JSON column
    pub const SIDE_POSE_DATA: &str = "side_pose_data";
    /// Overall score column
    pub const OVERALL_SCORE: &str = "overall_score";
    /// Category scores JSON column
    pub const SCORES_JSON: &str = "scores_json";
    /// Body type column
    pub const BODY_TYPE: &str = "body_type";
    /// Frame column
    pub const FRAME: &str = "frame";
    /// Strong areas JSON column
    pub const STRONG_AREAS_JSON: &str = "strong_areas_json";
    /// Growth areas JSON column
    pub const GROWTH_AREAS_JSON: &str = "growth_areas_json";
    /// Key insight column
    pub const KEY_INSIGHT: &str = "key_insight";
}

/// Baseline metrics table schema
pub mod baseline_metrics {
    /// Table name
    pub const TABLE: &str = "baseline_metrics";
    /// Primary key column
    pub const BASELINE_ID: &str = "baseline_id";
    /// Unique foreign key to users table
    pub const USER_ID: &str = "user_id";
    /// Foreign key to scans table
    pub const BASELINE_SCAN_ID: &str = "baseline_scan_id";
    /// Shoulder/hip ratio column
    pub const SHOULDER_HIP_RATIO: &str = "shoulder_hip_ratio";
    /// Waist/shoulder ratio column
    pub const WAIST_SHOULDER_RATIO: &str = "waist_shoulder_ratio";
    /// Arm/leg ratio column
    pub const ARM_LEG_RATIO: &str = "arm_leg_ratio";
    /// Normalized shoulder width column
    pub const SHOULDER_WIDTH_NORMALIZED: &str = "shoulder_width_normalized";
    /// Normalized hip width column
    pub const HIP_WIDTH_NORMALIZED: &str = "hip_width_normalized";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Progression table schema
pub mod progression {
    /// Table name
    pub const TABLE: &str = "progression";
    /// Primary key column
    pub const PROGRESSION_ID: &str = "progression_id";
    /// Foreign key to users table
    pub const USER_ID: &str = "user_id";
    /// Foreign key to scans table
    pub const SCAN_ID: &str = "scan_id";
    /// Elapsed whole days column
    pub const DAYS_SINCE_BASELINE: &str = "days_since_baseline";
    /// Overall delta column
    pub const OVERALL_SCORE_DELTA: &str = "overall_score_delta";
    /// Shoulder delta column
    pub const SHOULDER_SCORE_DELTA: &str = "shoulder_score_delta";
    /// Chest delta column
    pub const CHEST_SCORE_DELTA: &str = "chest_score_delta";
    /// Core delta column
    pub const CORE_SCORE_DELTA: &str = "core_score_delta";
    /// V-taper delta column
    pub const V_TAPER_SCORE_DELTA: &str = "v_taper_score_delta";
    /// Symmetry delta column
    pub const SYMMETRY_SCORE_DELTA: &str = "symmetry_score_delta";
    /// Posture delta column
    pub const POSTURE_SCORE_DELTA: &str = "posture_score_delta";
    /// Arms delta column
    pub const ARMS_SCORE_DELTA: &str = "arms_score_delta";
    /// Notes column
    pub const NOTES: &str = "notes";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}
