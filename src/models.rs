//! Data models for landmarks, scores and stored scans
//!
//! This module contains the data structures shared by the scorer, the
//! extractor, the repositories and the service layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PhysiqueError;
use crate::progression::{BaselineProportions, ScoreDeltas};

/// A single body keypoint produced by an external pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal coordinate (normalized 0-1)
    pub x: f64,
    /// Vertical coordinate (normalized 0-1, grows downwards)
    pub y: f64,
    /// Depth relative to the hips (unused by scoring)
    #[serde(default)]
    pub z: f64,
    /// Detection confidence (0-1)
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    /// Create a fully visible landmark at `(x, y)`
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }
}

/// Gender used to select a scoring model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    /// Male scoring model (fully implemented)
    Male,
    /// Female scoring model (placeholder)
    Female,
    /// Non-binary scoring model (placeholder)
    NonBinary,
}

impl Gender {
    /// Wire/storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::NonBinary => "non-binary",
        }
    }

    /// Capitalized label used in user-facing messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::NonBinary => "Non-binary",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = PhysiqueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "non-binary" | "nonbinary" | "non_binary" => Ok(Self::NonBinary),
            other => Err(PhysiqueError::UnknownGender(other.to_string())),
        }
    }
}

/// Scored physique categories, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Shoulder width relative to hips
    Shoulders,
    /// Shoulder-to-waist taper
    VTaper,
    /// Waist tightness relative to shoulders
    Core,
    /// Left/right balance
    Symmetry,
    /// Chest width relative to torso height
    Chest,
    /// Side-view alignment
    Posture,
    /// Arm-to-leg proportion
    Arms,
}

impl Category {
    /// All categories in evaluation order
    pub const ALL: [Self; 7] = [
        Self::Shoulders,
        Self::VTaper,
        Self::Core,
        Self::Symmetry,
        Self::Chest,
        Self::Posture,
        Self::Arms,
    ];

    /// Key used in score maps and stored JSON
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Shoulders => "shoulders",
            Self::VTaper => "v_taper",
            Self::Core => "core",
            Self::Symmetry => "symmetry",
            Self::Chest => "chest",
            Self::Posture => "posture",
            Self::Arms => "arms",
        }
    }

    /// Display name used in strong/growth area entries
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Shoulders => "Shoulders",
            Self::VTaper => "V-Taper",
            Self::Core => "Core",
            Self::Symmetry => "Symmetry",
            Self::Chest => "Chest",
            Self::Posture => "Posture",
            Self::Arms => "Arms",
        }
    }
}

/// Integer category scores (0-100) plus the weighted overall score
///
/// Missing keys deserialize to 0 so that scans stored by older scorers still
/// compare cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreSet {
    /// Shoulder score
    pub shoulders: i32,
    /// V-taper score
    pub v_taper: i32,
    /// Core score
    pub core: i32,
    /// Symmetry score
    pub symmetry: i32,
    /// Chest score
    pub chest: i32,
    /// Posture score
    pub posture: i32,
    /// Arms score
    pub arms: i32,
    /// Weighted overall score
    pub overall: i32,
}

impl ScoreSet {
    /// Score for a single category
    #[must_use]
    pub const fn get(&self, category: Category) -> i32 {
        match category {
            Category::Shoulders => self.shoulders,
            Category::VTaper => self.v_taper,
            Category::Core => self.core,
            Category::Symmetry => self.symmetry,
            Category::Chest => self.chest,
            Category::Posture => self.posture,
            Category::Arms => self.arms,
        }
    }

    /// Set the score for a single category
    pub fn set(&mut self, category: Category, score: i32) {
        match category {
            Category::Shoulders => self.shoulders = score,
            Category::VTaper => self.v_taper = score,
            Category::Core => self.core = score,
            Category::Symmetry => self.symmetry = score,
            Category::Chest => self.chest = score,
            Category::Posture => self.posture = score,
            Category::Arms => self.arms = score,
        }
    }
}

/// A strong or growth area entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaNote {
    /// Category display name
    pub name: String,
    /// Truncated category score
    pub score: i32,
    /// One-line description
    pub description: String,
}

/// Full result of the male physique scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysiqueAnalysis {
    /// Truncated weighted overall score
    pub overall_score: i32,
    /// Per-category scores
    pub scores: ScoreSet,
    /// Body type label
    pub body_type: String,
    /// One-line body type description
    pub body_description: String,
    /// Frame label
    pub frame: String,
    /// Up to three strongest areas, best first
    pub strong_areas: Vec<AreaNote>,
    /// Up to three weakest areas, weakest first
    pub growth_areas: Vec<AreaNote>,
    /// Combined strength/growth sentence
    pub key_insight: String,
}

/// Result of dispatching a scoring request by gender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoringOutcome {
    /// A scored physique
    Scored(PhysiqueAnalysis),
    /// The gender has no scoring model yet; `overall_score` is always 0
    Unsupported {
        /// Always 0
        overall_score: i32,
        /// "<Gender> physique analysis coming soon!"
        message: String,
    },
}

impl ScoringOutcome {
    /// Overall score; 0 is the "not supported" sentinel
    #[must_use]
    pub const fn overall_score(&self) -> i32 {
        match self {
            Self::Scored(analysis) => analysis.overall_score,
            Self::Unsupported { overall_score, .. } => *overall_score,
        }
    }

    /// The scored analysis, if any
    #[must_use]
    pub const fn analysis(&self) -> Option<&PhysiqueAnalysis> {
        match self {
            Self::Scored(analysis) => Some(analysis),
            Self::Unsupported { .. } => None,
        }
    }

    /// Whether a real scoring model produced this result
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Scored(_))
    }
}

/// Stored user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub user_id: String,
    /// Gender as supplied on first contact
    pub gender: Gender,
    /// Height in centimeters, if supplied
    pub height_cm: Option<f64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// User identifier
    pub user_id: String,
    /// Gender
    pub gender: Gender,
    /// Height in centimeters
    pub height_cm: Option<f64>,
}

/// Stored scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    /// Database primary key
    pub scan_id: i64,
    /// Owning user
    pub user_id: String,
    /// When the scan was taken
    pub scan_date: DateTime<Utc>,
    /// True for the user's first scan
    pub is_baseline: bool,
    /// Raw front-view landmarks
    pub front_pose: Vec<Landmark>,
    /// Raw side-view landmarks
    pub side_pose: Vec<Landmark>,
    /// Overall score at scan time
    pub overall_score: i32,
    /// Category scores at scan time
    pub scores: ScoreSet,
    /// Body type label
    pub body_type: Option<String>,
    /// Frame label
    pub frame: Option<String>,
    /// Strong areas at scan time
    pub strong_areas: Vec<AreaNote>,
    /// Growth areas at scan time
    pub growth_areas: Vec<AreaNote>,
    /// Key insight at scan time
    pub key_insight: Option<String>,
}

/// Data for creating a new scan
#[derive(Debug, Clone)]
pub struct NewScan {
    /// Owning user
    pub user_id: String,
    /// When the scan was taken
    pub scan_date: DateTime<Utc>,
    /// Raw front-view landmarks
    pub front_pose: Vec<Landmark>,
    /// Raw side-view landmarks
    pub side_pose: Vec<Landmark>,
    /// Scorer output to persist alongside the landmarks
    pub analysis: PhysiqueAnalysis,
}

/// Body proportions captured from a user's baseline scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
    /// Owning user (unique)
    pub user_id: String,
    /// Scan the proportions were computed from
    pub baseline_scan_id: i64,
    /// The proportions
    #[serde(flatten)]
    pub proportions: BaselineProportions,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Stored progression row joined with its scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    /// Database primary key
    pub progression_id: i64,
    /// Owning user
    pub user_id: String,
    /// Scan this row compares to the baseline
    pub scan_id: i64,
    /// Whole days between the baseline scan and this scan
    pub days_since_baseline: i64,
    /// Signed per-category deltas
    #[serde(flatten)]
    pub deltas: ScoreDeltas,
    /// Free-form notes (unused by the engine)
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Date of the compared scan
    pub scan_date: DateTime<Utc>,
    /// Overall score of the compared scan
    pub overall_score: i32,
}
