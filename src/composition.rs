//! Legacy body-composition analysis
//!
//! A simpler single-view estimator that predates the physique scorer. It
//! measures widths in estimated centimeters, lists strong and weak spots from
//! fixed thresholds, guesses body fat from a BMI proxy, and feeds the
//! template-driven diet plan and workout routine generators.
//!
//! This path deliberately does not share bands or constants with
//! [`crate::scoring`].

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::distance;
use crate::landmarks::{require_full_pose, Joint, PoseLandmarks};
use crate::models::{Landmark, ScoringOutcome};
use crate::utils::{ratio_or, round_to};

/// Normalized image units to estimated centimeters
const CM_PER_UNIT: f64 = 200.0;

const BASE_CALORIES: i32 = 2000;
const CALORIE_ADJUSTMENT: i32 = 300;

const MEALS: [&str; 6] = [
    "Breakfast: Oatmeal with berries, Greek yogurt, and almonds",
    "Mid-morning: Protein shake with banana",
    "Lunch: Grilled chicken breast, quinoa, and steamed vegetables",
    "Afternoon snack: Apple with peanut butter",
    "Dinner: Salmon, sweet potato, and mixed greens salad",
    "Evening: Casein protein or cottage cheese",
];

const WEEK: [(&str, &[&str]); 7] = [
    (
        "Day 1: Upper Body",
        &[
            "Barbell Bench Press: 4 sets x 6-8 reps",
            "Overhead Press: 4 sets x 6-8 reps",
            "Pull-ups: 4 sets x 8-10 reps",
            "Barbell Rows: 4 sets x 8-10 reps",
            "Lateral Raises: 3 sets x 12-15 reps",
            "Tricep Dips: 3 sets x 10-12 reps",
        ],
    ),
    (
        "Day 2: Lower Body",
        &[
            "Barbell Squats: 4 sets x 6-8 reps",
            "Romanian Deadlifts: 4 sets x 8-10 reps",
            "Leg Press: 4 sets x 10-12 reps",
            "Walking Lunges: 3 sets x 12 reps per leg",
            "Leg Curls: 3 sets x 12-15 reps",
            "Calf Raises: 4 sets x 15-20 reps",
        ],
    ),
    ("Day 3: Rest", &["Active recovery: Light stretching or yoga"]),
    (
        "Day 4: Push Focus",
        &[
            "Incline Dumbbell Press: 4 sets x 8-10 reps",
            "Dumbbell Shoulder Press: 4 sets x 8-10 reps",
            "Cable Flyes: 3 sets x 12-15 reps",
            "Side Lateral Raises: 3 sets x 15 reps",
            "Overhead Tricep Extension: 3 sets x 12 reps",
            "Push-ups: 3 sets to failure",
        ],
    ),
    (
        "Day 5: Pull Focus",
        &[
            "Deadlifts: 4 sets x 5-6 reps",
            "Wide-Grip Pull-ups: 4 sets x 8-10 reps",
            "T-Bar Rows: 4 sets x 8-10 reps",
            "Face Pulls: 3 sets x 15 reps",
            "Barbell Curls: 3 sets x 10-12 reps",
            "Hammer Curls: 3 sets x 12 reps",
        ],
    ),
    (
        "Day 6: Legs & Core",
        &[
            "Front Squats: 4 sets x 8-10 reps",
            "Bulgarian Split Squats: 3 sets x 10 reps per leg",
            "Romanian Deadlifts: 3 sets x 10 reps",
            "Plank: 3 sets x 60 seconds",
            "Russian Twists: 3 sets x 20 reps",
            "Leg Raises: 3 sets x 15 reps",
        ],
    ),
    ("Day 7: Rest", &["Complete rest or light activity"]),
];

/// Widths and lengths in estimated centimeters, rounded to 0.1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionMeasurements {
    /// Shoulder width
    pub shoulder_width: f64,
    /// Chest width (0.85 x shoulder width)
    pub chest_width: f64,
    /// Waist width (0.75 x hip width)
    pub waist_width: f64,
    /// Hip width
    pub hip_width: f64,
    /// Left shoulder to left wrist
    pub arm_length: f64,
    /// Left hip to left ankle
    pub leg_length: f64,
}

/// Proportions and bilateral alignment, ratios rounded to 0.001
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionRatios {
    /// Shoulder / hip width (1 when hips measure 0)
    pub shoulder_hip_ratio: f64,
    /// Arm / leg length (1 when legs measure 0)
    pub arm_leg_ratio: f64,
    /// Nose-to-hip height / leg length (1 when legs measure 0)
    pub torso_leg_ratio: f64,
    /// Vertical offset between the shoulders
    pub shoulder_level_diff: f64,
    /// Vertical offset between the hips
    pub hip_level_diff: f64,
}

/// Result of [`analyze_body`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyComposition {
    /// Rounded measurements
    pub measurements: CompositionMeasurements,
    /// Proportions
    pub ratios: CompositionRatios,
    /// Strengths, in rule order
    pub strong_spots: Vec<String>,
    /// Weaknesses, in rule order
    pub weak_spots: Vec<String>,
    /// Body fat percentage, 8 to 25
    pub body_fat_estimate: f64,
    /// `100 - body_fat_estimate`
    pub muscle_mass_estimate: f64,
}

/// Analyze body composition from a single complete pose
pub fn analyze_body(landmarks: &[Landmark]) -> Result<BodyComposition> {
    require_full_pose(landmarks, "pose")?;

    let left_shoulder = landmarks.joint(Joint::LeftShoulder)?;
    let right_shoulder = landmarks.joint(Joint::RightShoulder)?;
    let left_hip = landmarks.joint(Joint::LeftHip)?;
    let right_hip = landmarks.joint(Joint::RightHip)?;

    let shoulder_width = distance(left_shoulder, right_shoulder) * CM_PER_UNIT;
    let hip_width = distance(left_hip, right_hip) * CM_PER_UNIT;
    let arm_length = distance(left_shoulder, landmarks.joint(Joint::LeftWrist)?) * CM_PER_UNIT;
    let leg_length = distance(left_hip, landmarks.joint(Joint::LeftAnkle)?) * CM_PER_UNIT;
    let upper_body_height = distance(landmarks.joint(Joint::Nose)?, left_hip) * CM_PER_UNIT;

    let chest_width = shoulder_width * 0.85;
    let waist_width = hip_width * 0.75;

    let shoulder_hip_ratio = ratio_or(shoulder_width, hip_width, 1.0);
    let arm_leg_ratio = ratio_or(arm_length, leg_length, 1.0);
    let torso_leg_ratio = ratio_or(upper_body_height, leg_length, 1.0);
    let shoulder_level_diff = (left_shoulder.y - right_shoulder.y).abs();
    let hip_level_diff = (left_hip.y - right_hip.y).abs();

    let mut strong_spots = Vec::new();
    let mut weak_spots = Vec::new();
    let mut spot = |strong: bool, text: &str| {
        if strong {
            strong_spots.push(text.to_string());
        } else {
            weak_spots.push(text.to_string());
        }
    };

    if shoulder_width > 45.0 {
        spot(true, "Broad shoulders - excellent upper body frame");
    } else {
        spot(false, "Narrow shoulders - focus on shoulder width training");
    }

    if waist_width < 35.0 {
        spot(true, "Lean waist - good core definition");
    } else if waist_width > 40.0 {
        spot(false, "Wider waist - prioritize core strengthening and fat loss");
    }

    if shoulder_hip_ratio > 1.2 {
        spot(true, "V-taper physique - excellent shoulder-to-hip ratio");
    } else if shoulder_hip_ratio < 1.0 {
        spot(false, "Hip-dominant frame - focus on shoulder and back development");
    }

    if arm_leg_ratio > 0.45 && arm_leg_ratio < 0.55 {
        spot(true, "Balanced arm-to-leg proportions");
    } else if arm_leg_ratio < 0.4 {
        spot(false, "Shorter arms relative to legs - emphasize arm training");
    } else {
        spot(false, "Longer arms relative to legs - focus on leg development");
    }

    if shoulder_level_diff < 0.02 {
        spot(true, "Excellent shoulder symmetry");
    } else {
        spot(false, "Shoulder asymmetry detected - focus on unilateral training");
    }

    if hip_level_diff < 0.02 {
        spot(true, "Good hip alignment");
    } else {
        spot(false, "Hip imbalance - include corrective exercises");
    }

    let body_fat = estimate_body_fat(waist_width, shoulder_width);

    Ok(BodyComposition {
        measurements: CompositionMeasurements {
            shoulder_width: round_to(shoulder_width, 1),
            chest_width: round_to(chest_width, 1),
            waist_width: round_to(waist_width, 1),
            hip_width: round_to(hip_width, 1),
            arm_length: round_to(arm_length, 1),
            leg_length: round_to(leg_length, 1),
        },
        ratios: CompositionRatios {
            shoulder_hip_ratio: round_to(shoulder_hip_ratio, 3),
            arm_leg_ratio: round_to(arm_leg_ratio, 3),
            torso_leg_ratio: round_to(torso_leg_ratio, 3),
            shoulder_level_diff: round_to(shoulder_level_diff, 4),
            hip_level_diff: round_to(hip_level_diff, 4),
        },
        strong_spots,
        weak_spots,
        body_fat_estimate: round_to(body_fat, 1),
        muscle_mass_estimate: round_to(100.0 - body_fat, 1),
    })
}

/// BMI proxy from the waist/shoulder ratio
#[must_use]
pub fn estimate_bmi(waist_width: f64, shoulder_width: f64) -> f64 {
    let ratio = ratio_or(waist_width, shoulder_width, 1.0);
    18.0 + (ratio - 0.6) * 15.0
}

/// Body fat percentage, `0.8 x BMI proxy` clamped to 8..=25
#[must_use]
pub fn estimate_body_fat(waist_width: f64, shoulder_width: f64) -> f64 {
    (estimate_bmi(waist_width, shoulder_width) * 0.8).clamp(8.0, 25.0)
}

/// What the plan generators need, from either estimation path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    /// Body fat percentage
    pub body_fat_estimate: f64,
    /// Muscle mass percentage
    pub muscle_mass_estimate: f64,
    /// Free-text weaknesses, matched by keyword
    pub weak_spots: Vec<String>,
}

impl PlanInput {
    /// Plans from a legacy composition analysis
    #[must_use]
    pub fn from_composition(composition: &BodyComposition) -> Self {
        Self {
            body_fat_estimate: composition.body_fat_estimate,
            muscle_mass_estimate: composition.muscle_mass_estimate,
            weak_spots: composition.weak_spots.clone(),
        }
    }

    /// Plans from a physique score; growth-area descriptions act as weak spots.
    ///
    /// Returns `None` for the unsupported-gender sentinel so no plan is built
    /// on an overall score of 0.
    #[must_use]
    pub fn from_physique(outcome: &ScoringOutcome) -> Option<Self> {
        let analysis = outcome.analysis()?;
        let body_fat = (100.0 - f64::from(analysis.overall_score) * 0.2).clamp(8.0, 25.0);
        Some(Self {
            body_fat_estimate: body_fat,
            muscle_mass_estimate: 100.0 - body_fat,
            weak_spots: analysis.growth_areas.iter().map(|area| area.description.clone()).collect(),
        })
    }
}

/// Daily calories, macro grams and meal suggestions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietPlan {
    /// Daily calories
    pub calories: i32,
    /// Protein grams (30% of calories)
    pub protein: i32,
    /// Carbohydrate grams (40% of calories)
    pub carbs: i32,
    /// Fat grams (30% of calories)
    pub fats: i32,
    /// Six fixed meals
    pub meals: Vec<String>,
}

/// Build a diet plan: 2000 kcal, -300 above 18% body fat, +300 below 12%
#[must_use]
pub fn generate_diet_plan(input: &PlanInput) -> DietPlan {
    let adjustment = if input.body_fat_estimate > 18.0 {
        -CALORIE_ADJUSTMENT
    } else if input.body_fat_estimate < 12.0 {
        CALORIE_ADJUSTMENT
    } else {
        0
    };
    let calories = BASE_CALORIES + adjustment;
    let kcal = f64::from(calories);

    DietPlan {
        calories,
        protein: (kcal * 0.3 / 4.0).round_ties_even() as i32,
        carbs: (kcal * 0.4 / 4.0).round_ties_even() as i32,
        fats: (kcal * 0.3 / 9.0).round_ties_even() as i32,
        meals: MEALS.iter().map(ToString::to_string).collect(),
    }
}

/// One day of the weekly split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutDay {
    /// Day label
    pub day: String,
    /// Exercises with sets and reps
    pub exercises: Vec<String>,
}

/// Seven-day training split with a focus label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutRoutine {
    /// Training focus picked from the weak spots
    pub focus: String,
    /// Fixed weekly split
    pub days: Vec<WorkoutDay>,
}

/// Build the weekly routine; the last matching weak-spot keyword sets the focus
#[must_use]
pub fn generate_workout_routine(input: &PlanInput) -> WorkoutRoutine {
    let mentions = |keywords: &[&str]| {
        input.weak_spots.iter().any(|spot| {
            let spot = spot.to_lowercase();
            keywords.iter().any(|keyword| spot.contains(keyword))
        })
    };

    let mut focus = "Balanced full-body development";
    if mentions(&["shoulder"]) {
        focus = "Upper body emphasis - shoulders and back";
    }
    if mentions(&["waist", "core"]) {
        focus = "Core strengthening and definition";
    }
    if mentions(&["leg"]) {
        focus = "Lower body power and size";
    }

    WorkoutRoutine {
        focus: focus.to_string(),
        days: WEEK
            .iter()
            .map(|(day, exercises)| WorkoutDay {
                day: (*day).to_string(),
                exercises: exercises.iter().map(ToString::to_string).collect(),
            })
            .collect(),
    }
}
