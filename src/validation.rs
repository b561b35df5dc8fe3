use serde::{Deserialize, Serialize};

use crate::error::{PhysiqueError, Result};
use crate::landmarks::{require_full_pose, POSE_LANDMARK_COUNT};
use crate::models::Landmark;
use crate::utils::round_to;

/// Shortest and tallest heights accepted, in centimeters
const HEIGHT_RANGE_CM: std::ops::RangeInclusive<f64> = 50.0..=272.0;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a user identifier
    pub fn validate_user_id(user_id: &str) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(PhysiqueError::InvalidInput("User id cannot be empty".to_string()));
        }

        if user_id.len() > 100 {
            return Err(PhysiqueError::InvalidInput(
                "User id too long (max 100 characters)".to_string(),
            ));
        }

        if user_id.chars().any(char::is_control) {
            return Err(PhysiqueError::InvalidInput(
                "User id contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate an optional height in centimeters
    pub fn validate_height(height_cm: Option<f64>) -> Result<()> {
        match height_cm {
            Some(height) if !height.is_finite() || !HEIGHT_RANGE_CM.contains(&height) => {
                Err(PhysiqueError::InvalidInput(format!(
                    "Height must be between {} and {} cm, got {height}",
                    HEIGHT_RANGE_CM.start(),
                    HEIGHT_RANGE_CM.end()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Validate a pose: complete landmark set with finite coordinates
    pub fn validate_pose(landmarks: &[Landmark], view: &'static str) -> Result<()> {
        require_full_pose(landmarks, view)?;

        if let Some(index) = landmarks
            .iter()
            .position(|lm| !(lm.x.is_finite() && lm.y.is_finite() && lm.z.is_finite() && lm.visibility.is_finite()))
        {
            return Err(PhysiqueError::InvalidInput(format!(
                "{view} landmark {index} has a non-finite coordinate"
            )));
        }

        Ok(())
    }

    /// Validate the optional side view: empty, or a valid complete pose
    pub fn validate_side_pose(landmarks: &[Landmark]) -> Result<()> {
        if landmarks.is_empty() {
            return Ok(());
        }
        Self::validate_pose(landmarks, "side")
    }
}

/// Detection quality band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Average visibility above 0.8
    Excellent,
    /// Average visibility above 0.6
    Good,
    /// Everything else
    Poor,
}

/// Quality report for one pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseQuality {
    /// Number of landmarks supplied
    pub landmark_count: usize,
    /// Mean visibility, rounded to 3 places
    pub average_visibility: f64,
    /// Quality band
    pub quality: QualityLevel,
    /// Whether the mean visibility clears the configured minimum
    pub is_valid: bool,
}

/// Grade how well a pose was detected.
///
/// The pose must carry at least 33 landmarks. `is_valid` compares the
/// unrounded mean visibility to `min_visibility` (0.5 by default config).
pub fn assess_pose_quality(landmarks: &[Landmark], min_visibility: f64) -> Result<PoseQuality> {
    if landmarks.len() < POSE_LANDMARK_COUNT {
        return Err(PhysiqueError::InsufficientLandmarks {
            view: "pose",
            expected: POSE_LANDMARK_COUNT,
            actual: landmarks.len(),
        });
    }

    let average = landmarks.iter().map(|lm| lm.visibility).sum::<f64>() / landmarks.len() as f64;
    let quality = if average > 0.8 {
        QualityLevel::Excellent
    } else if average > 0.6 {
        QualityLevel::Good
    } else {
        QualityLevel::Poor
    };

    Ok(PoseQuality {
        landmark_count: landmarks.len(),
        average_visibility: round_to(average, 3),
        quality,
        is_valid: average > min_visibility,
    })
}
