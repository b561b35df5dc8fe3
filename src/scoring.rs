//! Physique scoring
//!
//! Maps body-proportion ratios to seven 0-100 category scores through ordered
//! threshold bands. Bands are tested top-down and the first match wins; each
//! band carries its own affine formula and saturating clamp, and may mark the
//! category as a strong or growth area.
//!
//! The band constants are hand-calibrated and must be kept exactly as they are
//! for stored scores to stay comparable across versions.

use tracing::debug;

use crate::error::Result;
use crate::geometry::distance;
use crate::landmarks::{require_full_pose, Joint, PoseLandmarks};
use crate::models::{AreaNote, Category, Gender, Landmark, PhysiqueAnalysis, ScoreSet, ScoringOutcome};
use crate::utils::ratio_or;

/// Posture score used when no side view is supplied
pub const DEFAULT_SIDE_POSTURE: f64 = 75.0;

/// Waist estimate as a fraction of hip width
const WAIST_TO_HIP: f64 = 0.75;

/// Chest width estimate as a fraction of shoulder width
const CHEST_TO_SHOULDER: f64 = 0.85;

/// Category weights of the overall score, in summation order
const WEIGHTS: [(Category, f64); 7] = [
    (Category::Shoulders, 0.20),
    (Category::VTaper, 0.18),
    (Category::Chest, 0.15),
    (Category::Core, 0.15),
    (Category::Symmetry, 0.12),
    (Category::Posture, 0.10),
    (Category::Arms, 0.10),
];

/// Whether a band marks its category as a strength or a weakness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaAssessment {
    /// Goes to `strong_areas` with this description
    Strong(&'static str),
    /// Goes to `growth_areas` with this description
    Growth(&'static str),
}

/// Score produced by one category band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rated {
    /// Unrounded score
    pub score: f64,
    /// Area entry the band emits, if any
    pub assessment: Option<AreaAssessment>,
}

impl Rated {
    const fn plain(score: f64) -> Self {
        Self { score, assessment: None }
    }

    const fn strong(score: f64, description: &'static str) -> Self {
        Self {
            score,
            assessment: Some(AreaAssessment::Strong(description)),
        }
    }

    const fn growth(score: f64, description: &'static str) -> Self {
        Self {
            score,
            assessment: Some(AreaAssessment::Growth(description)),
        }
    }

    fn growth_below(score: f64, threshold: f64, description: &'static str) -> Self {
        if score < threshold {
            Self::growth(score, description)
        } else {
            Self::plain(score)
        }
    }
}

/// Shoulder score from shoulder/hip width ratio
#[must_use]
pub fn rate_shoulders(ratio: f64) -> Rated {
    if ratio >= 1.45 {
        Rated::strong(
            (85.0 + (ratio - 1.45) * 50.0).min(100.0),
            "Outstanding shoulder width - exceptional frame",
        )
    } else if ratio >= 1.35 {
        Rated::strong(75.0 + (ratio - 1.35) * 100.0, "Excellent shoulder development")
    } else if ratio >= 1.25 {
        Rated::plain(65.0 + (ratio - 1.25) * 100.0)
    } else if ratio >= 1.15 {
        Rated::growth(
            55.0 + (ratio - 1.15) * 100.0,
            "Build shoulder width with lateral raises and overhead press",
        )
    } else {
        Rated::growth(
            (40.0 + ratio * 10.0).max(40.0),
            "Focus on shoulder width training - high priority",
        )
    }
}

/// V-taper score from shoulder/estimated-waist ratio
#[must_use]
pub fn rate_v_taper(ratio: f64) -> Rated {
    if ratio >= 1.8 {
        Rated::strong(
            (90.0 + (ratio - 1.8) * 25.0).min(100.0),
            "Elite V-taper physique - competition level",
        )
    } else if ratio >= 1.6 {
        Rated::strong(75.0 + (ratio - 1.6) * 75.0, "Strong shoulder-to-waist ratio")
    } else if ratio >= 1.4 {
        Rated::plain(60.0 + (ratio - 1.4) * 75.0)
    } else {
        Rated::growth_below((ratio * 35.0).max(45.0), 65.0, "Build wider shoulders and tighter core")
    }
}

/// Core score from estimated-waist/shoulder ratio (lower is better)
#[must_use]
pub fn rate_core(ratio: f64) -> Rated {
    if ratio <= 0.55 {
        Rated::strong(
            (95.0 + (0.55 - ratio) * 100.0).min(100.0),
            "Exceptional core definition and leanness",
        )
    } else if ratio <= 0.65 {
        Rated::strong(80.0 + (0.65 - ratio) * 150.0, "Well-defined midsection")
    } else if ratio <= 0.75 {
        Rated::plain(65.0 + (0.75 - ratio) * 150.0)
    } else {
        Rated::growth(
            (100.0 - ratio * 50.0).max(45.0),
            "Focus on core training and body fat reduction",
        )
    }
}

/// Symmetry score from mean shoulder/hip height imbalance
#[must_use]
pub fn rate_symmetry(imbalance: f64) -> Rated {
    if imbalance < 0.015 {
        Rated::strong(95.0 + (0.015 - imbalance) * 333.0, "Perfect left-right balance")
    } else if imbalance < 0.03 {
        Rated::plain(80.0 + (0.03 - imbalance) * 1000.0)
    } else if imbalance < 0.05 {
        Rated::plain(65.0 + (0.05 - imbalance) * 750.0)
    } else {
        Rated::growth_below(
            (100.0 - imbalance * 800.0).max(50.0),
            70.0,
            "Include unilateral exercises to balance development",
        )
    }
}

/// Chest score from estimated chest width / torso height
#[must_use]
pub fn rate_chest(ratio: f64) -> Rated {
    if ratio >= 0.45 {
        Rated::strong((85.0 + (ratio - 0.45) * 200.0).min(100.0), "Well-developed chest")
    } else if ratio >= 0.35 {
        Rated::plain(65.0 + (ratio - 0.35) * 200.0)
    } else {
        Rated::growth_below((ratio * 180.0).max(50.0), 65.0, "Build chest size with bench press variations")
    }
}

/// Posture score from side-view deviation; `None` means no side view
#[must_use]
pub fn rate_posture(deviation: Option<f64>) -> Rated {
    let Some(deviation) = deviation else {
        return Rated::plain(DEFAULT_SIDE_POSTURE);
    };

    if deviation < 0.08 {
        Rated::strong(90.0 + (0.08 - deviation) * 125.0, "Excellent upright posture")
    } else if deviation < 0.15 {
        Rated::plain(70.0 + (0.15 - deviation) * 285.0)
    } else {
        Rated::growth_below(
            (100.0 - deviation * 300.0).max(50.0),
            70.0,
            "Work on posture - include back strengthening exercises",
        )
    }
}

/// Arm score from arm/leg length ratio; ideal is 0.5, always within 60..=85
#[must_use]
pub fn rate_arms(ratio: f64) -> Rated {
    let score = (100.0 - (ratio - 0.5).abs() * 200.0).clamp(60.0, 85.0);
    Rated::growth_below(score, 75.0, "Increase arm size with curls and tricep work")
}

/// Ratios the male scorer reads from the landmarks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaleProportions {
    /// Shoulder width / hip width (1.0 when hips measure 0)
    pub shoulder_hip_ratio: f64,
    /// Shoulder width / estimated waist (1.0 when waist measures 0)
    pub v_taper_ratio: f64,
    /// Estimated waist / shoulder width (1.0 when shoulders measure 0)
    pub waist_shoulder_ratio: f64,
    /// Mean of shoulder and hip height differences
    pub imbalance: f64,
    /// Estimated chest width / nose-to-hip height (1.0 when height is 0)
    pub chest_torso_ratio: f64,
    /// Side-view deviation, `None` without a side view
    pub posture_deviation: Option<f64>,
    /// Left arm length / left leg length (1.0 when legs measure 0)
    pub arm_leg_ratio: f64,
}

impl MaleProportions {
    /// Measure a front view and an optional (empty) side view
    pub fn measure(front: &[Landmark], side: &[Landmark]) -> Result<Self> {
        let left_shoulder = front.joint(Joint::LeftShoulder)?;
        let right_shoulder = front.joint(Joint::RightShoulder)?;
        let left_hip = front.joint(Joint::LeftHip)?;
        let right_hip = front.joint(Joint::RightHip)?;

        let shoulder_width = distance(left_shoulder, right_shoulder);
        let hip_width = distance(left_hip, right_hip);
        let waist_width = hip_width * WAIST_TO_HIP;

        let imbalance =
            ((left_shoulder.y - right_shoulder.y).abs() + (left_hip.y - right_hip.y).abs()) / 2.0;

        let torso_height = distance(front.joint(Joint::Nose)?, left_hip);
        let arm_length = distance(left_shoulder, front.joint(Joint::LeftWrist)?);
        let leg_length = distance(left_hip, front.joint(Joint::LeftAnkle)?);

        let posture_deviation = if side.is_empty() {
            None
        } else {
            let nose = side.joint(Joint::Nose)?;
            let shoulder = side.joint(Joint::LeftShoulder)?;
            side.joint(Joint::LeftHip)?;
            let ankle = side.joint(Joint::LeftAnkle)?;

            let head_forward = (nose.x - shoulder.x).abs();
            let vertical_alignment = (shoulder.x - ankle.x).abs();
            Some((head_forward * 2.0 + vertical_alignment) / 3.0)
        };

        Ok(Self {
            shoulder_hip_ratio: ratio_or(shoulder_width, hip_width, 1.0),
            v_taper_ratio: ratio_or(shoulder_width, waist_width, 1.0),
            waist_shoulder_ratio: ratio_or(waist_width, shoulder_width, 1.0),
            imbalance,
            chest_torso_ratio: ratio_or(shoulder_width * CHEST_TO_SHOULDER, torso_height, 1.0),
            posture_deviation,
            arm_leg_ratio: ratio_or(arm_length, leg_length, 1.0),
        })
    }
}

/// Score a physique, dispatching on gender.
///
/// Female and non-binary models are not available yet; they return
/// [`ScoringOutcome::Unsupported`] with an overall score of 0 and never look
/// at the landmarks.
pub fn score_physique(
    gender: Gender,
    front: &[Landmark],
    side: &[Landmark],
    height_cm: Option<f64>,
) -> Result<ScoringOutcome> {
    match gender {
        Gender::Male => score_male_physique(front, side, height_cm).map(ScoringOutcome::Scored),
        Gender::Female | Gender::NonBinary => Ok(unsupported(gender)),
    }
}

fn unsupported(gender: Gender) -> ScoringOutcome {
    ScoringOutcome::Unsupported {
        overall_score: 0,
        message: format!("{} physique analysis coming soon!", gender.label()),
    }
}

/// Score a male physique from front and side landmarks.
///
/// The front view must carry all 33 landmarks. An empty side view scores
/// posture at [`DEFAULT_SIDE_POSTURE`]; a non-empty one must be complete.
/// `height_cm` is accepted for future calibration and does not affect scores.
pub fn score_male_physique(front: &[Landmark], side: &[Landmark], height_cm: Option<f64>) -> Result<PhysiqueAnalysis> {
    require_full_pose(front, "front")?;
    if !side.is_empty() {
        require_full_pose(side, "side")?;
    }

    let proportions = MaleProportions::measure(front, side)?;
    debug!(?proportions, ?height_cm, "Scoring male physique");

    let rated = [
        (Category::Shoulders, rate_shoulders(proportions.shoulder_hip_ratio)),
        (Category::VTaper, rate_v_taper(proportions.v_taper_ratio)),
        (Category::Core, rate_core(proportions.waist_shoulder_ratio)),
        (Category::Symmetry, rate_symmetry(proportions.imbalance)),
        (Category::Chest, rate_chest(proportions.chest_torso_ratio)),
        (Category::Posture, rate_posture(proportions.posture_deviation)),
        (Category::Arms, rate_arms(proportions.arm_leg_ratio)),
    ];

    let mut strong_areas = Vec::new();
    let mut growth_areas = Vec::new();
    for (category, rating) in &rated {
        let note = |description: &str| AreaNote {
            name: category.display_name().to_string(),
            score: rating.score as i32,
            description: description.to_string(),
        };
        match rating.assessment {
            Some(AreaAssessment::Strong(description)) => strong_areas.push(note(description)),
            Some(AreaAssessment::Growth(description)) => growth_areas.push(note(description)),
            None => {}
        }
    }

    let overall = overall_score(&rated);
    let (body_type, body_description) = classify_body_type(overall);
    let frame = classify_frame(proportions.shoulder_hip_ratio);

    let (top, bottom) = extremes(&rated);
    let key_insight = generate_key_insight(top, bottom);

    strong_areas.sort_by(|a, b| b.score.cmp(&a.score));
    growth_areas.sort_by(|a, b| a.score.cmp(&b.score));
    strong_areas.truncate(3);
    growth_areas.truncate(3);

    let mut scores = ScoreSet {
        overall: overall as i32,
        ..ScoreSet::default()
    };
    for (category, rating) in &rated {
        scores.set(*category, rating.score as i32);
    }

    Ok(PhysiqueAnalysis {
        overall_score: overall as i32,
        scores,
        body_type: body_type.to_string(),
        body_description: body_description.to_string(),
        frame: frame.to_string(),
        strong_areas,
        growth_areas,
        key_insight,
    })
}

fn overall_score(rated: &[(Category, Rated)]) -> f64 {
    WEIGHTS
        .iter()
        .map(|(weight_category, weight)| {
            rated
                .iter()
                .find(|(category, _)| category == weight_category)
                .map_or(0.0, |(_, rating)| rating.score * weight)
        })
        .sum()
}

/// Highest and lowest scoring categories; ties go to the earlier category
fn extremes(rated: &[(Category, Rated)]) -> (Category, Category) {
    let (mut top, mut top_score) = (Category::Shoulders, f64::NEG_INFINITY);
    let (mut bottom, mut bottom_score) = (Category::Shoulders, f64::INFINITY);
    for (category, rating) in rated {
        if rating.score > top_score {
            top = *category;
            top_score = rating.score;
        }
        if rating.score < bottom_score {
            bottom = *category;
            bottom_score = rating.score;
        }
    }
    (top, bottom)
}

/// Body type label and description for an overall score
#[must_use]
pub fn classify_body_type(overall: f64) -> (&'static str, &'static str) {
    if overall >= 85.0 {
        ("Elite Physique", "Competition-level development")
    } else if overall >= 75.0 {
        ("Athletic", "Strong, well-developed physique")
    } else if overall >= 65.0 {
        ("Above Average", "Good muscle development")
    } else if overall >= 55.0 {
        ("Average", "Solid foundation to build on")
    } else {
        ("Beginner", "Great potential for improvement")
    }
}

/// Frame label for a shoulder/hip ratio
#[must_use]
pub fn classify_frame(shoulder_hip_ratio: f64) -> &'static str {
    if shoulder_hip_ratio >= 1.4 {
        "Wide Frame"
    } else if shoulder_hip_ratio >= 1.25 {
        "Athletic Frame"
    } else if shoulder_hip_ratio >= 1.15 {
        "Medium Frame"
    } else {
        "Narrow Frame"
    }
}

/// Strength sentence for `top` followed by a growth sentence for `bottom`
#[must_use]
pub fn generate_key_insight(top: Category, bottom: Category) -> String {
    let strength = match top {
        Category::Shoulders => {
            "Your shoulders are your greatest strength - they provide an excellent foundation for an impressive physique."
        }
        Category::VTaper => {
            "You have a natural V-taper that many strive for - your shoulder-to-waist ratio is exceptional."
        }
        Category::Chest => "Your chest development is strong - continue building on this foundation.",
        Category::Core => "Your core definition is excellent - this gives you a lean, athletic appearance.",
        Category::Symmetry => "Your physique shows excellent symmetry - balanced development across both sides.",
        Category::Posture => "Your posture is outstanding - you carry yourself with confidence and alignment.",
        Category::Arms => "Your arm proportions are well-balanced with your overall frame.",
    };

    let growth = match bottom {
        Category::Shoulders => "Focus on shoulder width training to enhance your frame.",
        Category::VTaper => "Build wider shoulders and tighten your core to improve your V-taper.",
        Category::Chest => "Prioritize chest development to add thickness to your upper body.",
        Category::Core => "Core strengthening and fat loss will enhance overall definition.",
        Category::Symmetry => "Include unilateral exercises to balance your development.",
        Category::Posture => "Work on posture with back strengthening and mobility work.",
        Category::Arms => "Add dedicated arm work to match your torso development.",
    };

    format!("{strength} {growth}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shoulder_band_lower_edges() {
        assert!((rate_shoulders(1.45).score - 85.0).abs() < 1e-9);
        assert!((rate_shoulders(1.35).score - 75.0).abs() < 1e-9);
        assert!((rate_shoulders(1.25).score - 65.0).abs() < 1e-9);
        assert!((rate_shoulders(1.15).score - 55.0).abs() < 1e-9);
        assert!((rate_shoulders(1.0).score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_shoulder_top_band_saturates() {
        assert!((rate_shoulders(2.5).score - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_v_taper_growth_only_below_threshold() {
        let low = rate_v_taper(1.0);
        assert!((low.score - 45.0).abs() < 1e-9);
        assert!(matches!(low.assessment, Some(AreaAssessment::Growth(_))));
        assert_eq!(rate_v_taper(1.5).assessment, None);
    }

    #[test]
    fn test_core_is_inverted() {
        assert!((rate_core(0.55).score - 95.0).abs() < 1e-9);
        assert!((rate_core(0.0).score - 100.0).abs() < 1e-9);
        assert!((rate_core(0.9).score - 55.0).abs() < 1e-9);
        assert!((rate_core(2.0).score - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetry_bands() {
        assert!(matches!(rate_symmetry(0.0).assessment, Some(AreaAssessment::Strong(_))));
        assert!((rate_symmetry(0.03).score - 65.0 - 0.02 * 750.0).abs() < 1e-9);
        let poor = rate_symmetry(0.1);
        assert!((poor.score - 50.0).abs() < 1e-9);
        assert!(matches!(poor.assessment, Some(AreaAssessment::Growth(_))));
    }

    #[test]
    fn test_posture_default_without_side_view() {
        let rated = rate_posture(None);
        assert!((rated.score - DEFAULT_SIDE_POSTURE).abs() < f64::EPSILON);
        assert_eq!(rated.assessment, None);
    }

    #[test]
    fn test_arms_are_clamped() {
        assert!((rate_arms(0.5).score - 85.0).abs() < f64::EPSILON);
        assert!((rate_arms(3.0).score - 60.0).abs() < f64::EPSILON);
        assert_eq!(rate_arms(0.5).assessment, None);
    }

    #[test]
    fn test_classifications() {
        assert_eq!(classify_body_type(85.0).0, "Elite Physique");
        assert_eq!(classify_body_type(54.9).0, "Beginner");
        assert_eq!(classify_frame(1.4), "Wide Frame");
        assert_eq!(classify_frame(1.0), "Narrow Frame");
    }

    #[test]
    fn test_key_insight_combines_templates() {
        let insight = generate_key_insight(Category::Posture, Category::Arms);
        assert!(insight.starts_with("Your posture is outstanding"));
        assert!(insight.ends_with("match your torso development."));
    }

    #[test]
    fn test_unsupported_genders_ignore_landmarks() {
        let outcome = score_physique(Gender::NonBinary, &[], &[], None).expect("never fails");
        assert_eq!(outcome.overall_score(), 0);
        assert!(!outcome.is_supported());
    }
}
