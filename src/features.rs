//! Body feature extraction
//!
//! Turns front/side landmarks into normalized measurements, ratios, 0-100
//! sub-scores, text insights and prioritized focus areas. This bundle is what
//! pathway generation consumes, so its field names are part of the contract.
//!
//! Extraction never fails: any error while reading landmarks is caught once,
//! logged, and replaced by [`BodyFeatures::fallback`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{distance, midpoint};
use crate::landmarks::{Joint, PoseLandmarks};
use crate::models::{Gender, Landmark};
use crate::utils::{ratio_or, round_score, round_to};

/// Score returned when the side view cannot be read
pub const DEFAULT_POSTURE_SCORE: f64 = 70.0;

/// Estimated waist as a fraction of hip width
const WAIST_TO_HIP: f64 = 0.85;

/// Guards the symmetry denominator when both arms measure ~0
const SYMMETRY_EPSILON: f64 = 0.001;

/// Distances measured on the front view (normalized image units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurements {
    /// Shoulder-to-shoulder distance
    pub shoulder_width: f64,
    /// Hip-to-hip distance
    pub hip_width: f64,
    /// Mean shoulder-to-hip distance
    pub torso_length: f64,
    /// Mean hip-to-ankle distance
    pub leg_length: f64,
    /// Nose to ankle midpoint
    pub body_height: f64,
}

/// Proportions derived from [`RawMeasurements`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRatios {
    /// Shoulder width / hip width (0 when hips measure 0)
    pub shoulder_hip_ratio: f64,
    /// Shoulder width / estimated waist (0 when waist measures 0)
    pub shoulder_waist_ratio: f64,
    /// Torso length / leg length (0 when legs measure 0)
    pub torso_leg_ratio: f64,
    /// Bilateral arm-length symmetry, 1.0 is perfect
    pub symmetry: f64,
}

/// Rounded 0-100 sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureScores {
    /// V-taper score
    pub vtaper: i32,
    /// Symmetry score
    pub symmetry: i32,
    /// Posture score
    pub posture: i32,
    /// Weighted overall score
    pub overall: i32,
}

/// Focus-area priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Address first
    High,
    /// Address soon
    Medium,
    /// Nice to have
    Low,
}

/// A training recommendation derived from a weak sub-score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusArea {
    /// Body area
    pub area: String,
    /// How urgent the area is
    pub priority: Priority,
    /// Suggested exercises
    pub recommendation: String,
}

impl FocusArea {
    fn new(area: &str, priority: Priority, recommendation: &str) -> Self {
        Self {
            area: area.to_string(),
            priority,
            recommendation: recommendation.to_string(),
        }
    }
}

/// Everything the extractor produces for one front/side pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyFeatures {
    /// Measurements, absent (`{}` on the wire) in the fallback bundle
    #[serde(with = "empty_map", default)]
    pub raw_measurements: Option<RawMeasurements>,
    /// Ratios, absent (`{}` on the wire) in the fallback bundle
    #[serde(with = "empty_map", default)]
    pub ratios: Option<FeatureRatios>,
    /// Sub-scores
    pub scores: FeatureScores,
    /// One sentence per sub-score band
    pub insights: Vec<String>,
    /// Prioritized recommendations
    pub focus_areas: Vec<FocusArea>,
}

impl BodyFeatures {
    /// Bundle substituted when the landmarks cannot be analyzed
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            raw_measurements: None,
            ratios: None,
            scores: FeatureScores {
                vtaper: 70,
                symmetry: 80,
                posture: 70,
                overall: 70,
            },
            insights: vec!["Unable to fully analyze - using baseline assessment".to_string()],
            focus_areas: vec![FocusArea::new("general fitness", Priority::Medium, "Full body training")],
        }
    }

    /// Whether this bundle is the fallback rather than a real measurement
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.raw_measurements.is_none()
    }
}

/// Serializes `None` as an empty object so consumers can always index the field
mod empty_map {
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeEmpty<T> {
        Present(T),
        Empty {},
    }

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(match Option::<MaybeEmpty<T>>::deserialize(deserializer)? {
            Some(MaybeEmpty::Present(inner)) => Some(inner),
            Some(MaybeEmpty::Empty {}) | None => None,
        })
    }
}

/// Extract features from a front/side landmark pair.
///
/// Never fails; malformed input yields [`BodyFeatures::fallback`].
#[must_use]
pub fn extract_body_features(front_pose: &[Landmark], side_pose: &[Landmark], gender: Gender) -> BodyFeatures {
    match try_extract(front_pose, side_pose, gender) {
        Ok(features) => features,
        Err(err) => {
            warn!(error = %err, front_len = front_pose.len(), "Feature extraction failed, using defaults");
            BodyFeatures::fallback()
        }
    }
}

fn try_extract(front: &[Landmark], side: &[Landmark], gender: Gender) -> Result<BodyFeatures> {
    let left_shoulder = front.joint(Joint::LeftShoulder)?;
    let right_shoulder = front.joint(Joint::RightShoulder)?;
    let left_hip = front.joint(Joint::LeftHip)?;
    let right_hip = front.joint(Joint::RightHip)?;
    // Knees are part of the required set even though no measurement uses them yet
    front.joint(Joint::LeftKnee)?;
    front.joint(Joint::RightKnee)?;
    let left_ankle = front.joint(Joint::LeftAnkle)?;
    let right_ankle = front.joint(Joint::RightAnkle)?;
    let nose = front.joint(Joint::Nose)?;
    let left_wrist = front.joint(Joint::LeftWrist)?;
    let right_wrist = front.joint(Joint::RightWrist)?;

    let shoulder_width = distance(left_shoulder, right_shoulder);
    let hip_width = distance(left_hip, right_hip);
    let torso_length = (distance(left_shoulder, left_hip) + distance(right_shoulder, right_hip)) / 2.0;
    let leg_length = (distance(left_hip, left_ankle) + distance(right_hip, right_ankle)) / 2.0;
    let body_height = distance(nose, &midpoint(left_ankle, right_ankle));

    let shoulder_hip_ratio = ratio_or(shoulder_width, hip_width, 0.0);
    let shoulder_waist_ratio = ratio_or(shoulder_width, hip_width * WAIST_TO_HIP, 0.0);
    let torso_leg_ratio = ratio_or(torso_length, leg_length, 0.0);

    let left_arm = distance(left_shoulder, left_wrist);
    let right_arm = distance(right_shoulder, right_wrist);
    let symmetry = 1.0 - (left_arm - right_arm).abs() / left_arm.max(right_arm).max(SYMMETRY_EPSILON);

    let ideal_ratio = if gender == Gender::Male { 1.6 } else { 1.4 };
    let vtaper_score = (100.0 - (shoulder_hip_ratio - ideal_ratio).abs() * 50.0).clamp(0.0, 100.0);
    let symmetry_score = symmetry * 100.0;
    let posture_score = posture_score(side);
    let overall_score = vtaper_score * 0.35 + symmetry_score * 0.25 + posture_score * 0.40;

    debug!(
        shoulder_hip_ratio,
        symmetry, vtaper_score, posture_score, overall_score, "Extracted body features"
    );

    Ok(BodyFeatures {
        raw_measurements: Some(RawMeasurements {
            shoulder_width: round_to(shoulder_width, 4),
            hip_width: round_to(hip_width, 4),
            torso_length: round_to(torso_length, 4),
            leg_length: round_to(leg_length, 4),
            body_height: round_to(body_height, 4),
        }),
        ratios: Some(FeatureRatios {
            shoulder_hip_ratio: round_to(shoulder_hip_ratio, 3),
            shoulder_waist_ratio: round_to(shoulder_waist_ratio, 3),
            torso_leg_ratio: round_to(torso_leg_ratio, 3),
            symmetry: round_to(symmetry, 3),
        }),
        scores: FeatureScores {
            vtaper: round_score(vtaper_score),
            symmetry: round_score(symmetry_score),
            posture: round_score(posture_score),
            overall: round_score(overall_score),
        },
        insights: insights(vtaper_score, symmetry_score, posture_score),
        focus_areas: focus_areas(vtaper_score, symmetry_score, posture_score, gender),
    })
}

/// Posture score from the side view: ear, shoulder and hip should stack vertically.
///
/// Returns [`DEFAULT_POSTURE_SCORE`] when any required side landmark is missing.
#[must_use]
pub fn posture_score(side_pose: &[Landmark]) -> f64 {
    side_posture(side_pose).unwrap_or(DEFAULT_POSTURE_SCORE)
}

fn side_posture(side: &[Landmark]) -> Result<f64> {
    let ear = side.joint(Joint::LeftEar)?;
    let shoulder = side.joint(Joint::LeftShoulder)?;
    let hip = side.joint(Joint::LeftHip)?;
    side.joint(Joint::LeftKnee)?;
    side.joint(Joint::LeftAnkle)?;

    let deviation = (ear.x - shoulder.x).abs() + (shoulder.x - hip.x).abs();
    Ok((100.0 - deviation * 200.0).clamp(0.0, 100.0))
}

fn insights(vtaper: f64, symmetry: f64, posture: f64) -> Vec<String> {
    let vtaper_text = if vtaper >= 80.0 {
        "Excellent shoulder-to-hip ratio indicating good V-taper"
    } else if vtaper >= 60.0 {
        "Good foundation for V-taper, can be improved with shoulder/lat work"
    } else {
        "V-taper needs development - focus on shoulder width and waist reduction"
    };

    let symmetry_text = if symmetry >= 90.0 {
        "Excellent left-right body symmetry"
    } else if symmetry >= 75.0 {
        "Good symmetry with minor imbalances to address"
    } else {
        "Noticeable asymmetry - incorporate unilateral exercises"
    };

    let posture_text = if posture >= 80.0 {
        "Good posture alignment"
    } else if posture >= 60.0 {
        "Some postural issues - focus on core and back strengthening"
    } else {
        "Significant posture concerns - prioritize corrective exercises"
    };

    vec![vtaper_text.to_string(), symmetry_text.to_string(), posture_text.to_string()]
}

fn focus_areas(vtaper: f64, symmetry: f64, posture: f64, gender: Gender) -> Vec<FocusArea> {
    let mut areas = Vec::new();

    if vtaper < 70.0 {
        let priority = if vtaper < 50.0 { Priority::High } else { Priority::Medium };
        areas.push(FocusArea::new("shoulders", priority, "Lateral raises, overhead press, face pulls"));
        areas.push(FocusArea::new("lats", priority, "Pull-ups, lat pulldowns, rows"));
    }

    if symmetry < 85.0 {
        areas.push(FocusArea::new(
            "symmetry",
            Priority::Medium,
            "Unilateral dumbbell exercises, single-leg work",
        ));
    }

    if posture < 70.0 {
        let priority = if posture < 50.0 { Priority::High } else { Priority::Medium };
        areas.push(FocusArea::new("posture", priority, "Core work, back extensions, stretching"));
    }

    match gender {
        Gender::Male => {
            areas.push(FocusArea::new("chest", Priority::Medium, "Bench press variations, push-ups, flyes"));
            areas.push(FocusArea::new("arms", Priority::Low, "Compound movements + isolation work"));
        }
        Gender::Female | Gender::NonBinary => {
            areas.push(FocusArea::new("glutes", Priority::Medium, "Hip thrusts, squats, lunges"));
            areas.push(FocusArea::new("core", Priority::Medium, "Planks, dead bugs, ab work"));
        }
    }

    areas
}
