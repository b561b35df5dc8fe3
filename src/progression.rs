//! Baseline proportions and progression deltas.
//!
//! The first scan a user submits becomes their permanent baseline. Every later
//! scan is compared against it: signed per-category deltas plus the number of
//! whole days elapsed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::distance;
use crate::landmarks::{Joint, PoseLandmarks};
use crate::models::{Category, Landmark, ScoreSet};
use crate::utils::ratio_or;

const SECONDS_PER_DAY: i64 = 86_400;

/// Waist estimate as a fraction of hip width
const WAIST_TO_HIP: f64 = 0.75;

/// Body proportions measured on a baseline scan's front view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineProportions {
    /// Shoulder width / hip width (1.0 when hips measure 0)
    pub shoulder_hip_ratio: f64,
    /// Estimated waist / shoulder width (1.0 when shoulders measure 0)
    pub waist_shoulder_ratio: f64,
    /// Left arm / left leg length (1.0 when the leg measures 0)
    pub arm_leg_ratio: f64,
    /// Raw shoulder width in normalized image units
    pub shoulder_width_normalized: f64,
    /// Raw hip width in normalized image units
    pub hip_width_normalized: f64,
}

impl BaselineProportions {
    /// Measure proportions from front-view landmarks
    pub fn from_front(front: &[Landmark]) -> Result<Self> {
        let left_shoulder = front.joint(Joint::LeftShoulder)?;
        let right_shoulder = front.joint(Joint::RightShoulder)?;
        let left_hip = front.joint(Joint::LeftHip)?;
        let right_hip = front.joint(Joint::RightHip)?;
        let left_wrist = front.joint(Joint::LeftWrist)?;
        let left_ankle = front.joint(Joint::LeftAnkle)?;

        let shoulder_width = distance(left_shoulder, right_shoulder);
        let hip_width = distance(left_hip, right_hip);
        let arm_length = distance(left_shoulder, left_wrist);
        let leg_length = distance(left_hip, left_ankle);

        Ok(Self {
            shoulder_hip_ratio: ratio_or(shoulder_width, hip_width, 1.0),
            waist_shoulder_ratio: ratio_or(hip_width * WAIST_TO_HIP, shoulder_width, 1.0),
            arm_leg_ratio: ratio_or(arm_length, leg_length, 1.0),
            shoulder_width_normalized: shoulder_width,
            hip_width_normalized: hip_width,
        })
    }
}

/// Signed `current - baseline` score differences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreDeltas {
    /// Overall score delta
    #[serde(rename = "overall_score_delta")]
    pub overall: i32,
    /// Shoulder score delta
    #[serde(rename = "shoulder_score_delta")]
    pub shoulders: i32,
    /// Chest score delta
    #[serde(rename = "chest_score_delta")]
    pub chest: i32,
    /// Core score delta
    #[serde(rename = "core_score_delta")]
    pub core: i32,
    /// V-taper score delta
    #[serde(rename = "v_taper_score_delta")]
    pub v_taper: i32,
    /// Symmetry score delta
    #[serde(rename = "symmetry_score_delta")]
    pub symmetry: i32,
    /// Posture score delta
    #[serde(rename = "posture_score_delta")]
    pub posture: i32,
    /// Arms score delta
    #[serde(rename = "arms_score_delta")]
    pub arms: i32,
}

impl ScoreDeltas {
    /// Deltas from `baseline` to `current`.
    ///
    /// Categories missing from a stored score set were deserialized as 0, so
    /// they contribute their full value to the delta.
    #[must_use]
    pub const fn between(current: &ScoreSet, baseline: &ScoreSet) -> Self {
        Self {
            overall: current.overall - baseline.overall,
            shoulders: current.shoulders - baseline.shoulders,
            chest: current.chest - baseline.chest,
            core: current.core - baseline.core,
            v_taper: current.v_taper - baseline.v_taper,
            symmetry: current.symmetry - baseline.symmetry,
            posture: current.posture - baseline.posture,
            arms: current.arms - baseline.arms,
        }
    }

    /// Delta for a single category
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
}

/// Whole days from `baseline` to `now`, floored.
///
/// A scan taken before its baseline (clock skew) yields a negative count
/// rather than rounding toward zero.
#[must_use]
pub fn days_since_baseline(baseline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - baseline).num_seconds().div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn front_pose() -> Vec<Landmark> {
        let mut pose = vec![Landmark::new(0.5, 0.5); 33];
        pose[11] = Landmark::new(0.3, 0.4);
        pose[12] = Landmark::new(0.7, 0.4);
        pose[23] = Landmark::new(0.35, 0.7);
        pose[24] = Landmark::new(0.65, 0.7);
        pose[15] = Landmark::new(0.3, 0.6);
        pose[27] = Landmark::new(0.35, 1.1);
        pose
    }

    #[test]
    fn test_baseline_proportions() {
        let props = BaselineProportions::from_front(&front_pose()).expect("complete pose");
        assert!((props.shoulder_hip_ratio - 0.4 / 0.3).abs() < 1e-9);
        assert!((props.waist_shoulder_ratio - 0.225 / 0.4).abs() < 1e-9);
        assert!((props.arm_leg_ratio - 0.5).abs() < 1e-9);
        assert!((props.shoulder_width_normalized - 0.4).abs() < 1e-9);
        assert!((props.hip_width_normalized - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_proportions_fall_back_on_zero_widths() {
        let pose = vec![Landmark::new(0.5, 0.5); 33];
        let props = BaselineProportions::from_front(&pose).expect("complete pose");
        assert!((props.shoulder_hip_ratio - 1.0).abs() < f64::EPSILON);
        assert!((props.waist_shoulder_ratio - 1.0).abs() < f64::EPSILON);
        assert!((props.arm_leg_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_short_pose_is_rejected() {
        assert!(BaselineProportions::from_front(&vec![Landmark::default(); 20]).is_err());
    }

    #[test]
    fn test_deltas_are_signed() {
        let baseline = ScoreSet {
            overall: 70,
            shoulders: 80,
            arms: 75,
            ..ScoreSet::default()
        };
        let current = ScoreSet {
            overall: 68,
            shoulders: 85,
            chest: 60,
            ..ScoreSet::default()
        };
        let deltas = ScoreDeltas::between(&current, &baseline);
        assert_eq!(deltas.overall, -2);
        assert_eq!(deltas.shoulders, 5);
        assert_eq!(deltas.chest, 60);
        assert_eq!(deltas.get(Category::Arms), -75);
    }

    #[test]
    fn test_days_are_floored() {
        let baseline = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(days_since_baseline(baseline, baseline + Duration::hours(23)), 0);
        assert_eq!(days_since_baseline(baseline, baseline + Duration::hours(49)), 2);
        assert_eq!(days_since_baseline(baseline, baseline - Duration::hours(1)), -1);
    }
}
