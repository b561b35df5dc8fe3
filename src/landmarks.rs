//! Landmark index convention for 33-point pose estimators.
//!
//! Only 17 of the 33 keypoints are read by the engine. Every lookup is
//! bounds-checked and reports the missing joint instead of reading past the
//! supplied sequence.

use std::collections::BTreeMap;

use crate::error::{PhysiqueError, Result};
use crate::models::Landmark;

/// Number of landmarks a complete pose carries
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Joints consumed by the engine, valued by their landmark index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    /// Nose
    Nose = 0,
    /// Left eye
    LeftEye = 2,
    /// Right eye
    RightEye = 5,
    /// Left ear
    LeftEar = 7,
    /// Right ear
    RightEar = 8,
    /// Left shoulder
    LeftShoulder = 11,
    /// Right shoulder
    RightShoulder = 12,
    /// Left elbow
    LeftElbow = 13,
    /// Right elbow
    RightElbow = 14,
    /// Left wrist
    LeftWrist = 15,
    /// Right wrist
    RightWrist = 16,
    /// Left hip
    LeftHip = 23,
    /// Right hip
    RightHip = 24,
    /// Left knee
    LeftKnee = 25,
    /// Right knee
    RightKnee = 26,
    /// Left ankle
    LeftAnkle = 27,
    /// Right ankle
    RightAnkle = 28,
}

impl Joint {
    /// Every consumed joint
    pub const ALL: [Self; 17] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Index into a landmark sequence
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Snake-case joint name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// Bounds-checked joint access on a landmark sequence
pub trait PoseLandmarks {
    /// The landmark for `joint`, or `MissingLandmark` if the sequence is too short
    fn joint(&self, joint: Joint) -> Result<&Landmark>;
}

impl PoseLandmarks for [Landmark] {
    fn joint(&self, joint: Joint) -> Result<&Landmark> {
        self.get(joint.index()).ok_or(PhysiqueError::MissingLandmark {
            name: joint.name(),
            index: joint.index(),
        })
    }
}

/// Fail unless `pose` carries a complete 33-point landmark set
pub fn require_full_pose(pose: &[Landmark], view: &'static str) -> Result<()> {
    if pose.len() < POSE_LANDMARK_COUNT {
        return Err(PhysiqueError::InsufficientLandmarks {
            view,
            expected: POSE_LANDMARK_COUNT,
            actual: pose.len(),
        });
    }
    Ok(())
}

/// Map of joint name to landmark for every consumed joint present in `pose`
#[must_use]
pub fn extract_key_landmarks(pose: &[Landmark]) -> BTreeMap<&'static str, Landmark> {
    Joint::ALL
        .iter()
        .filter_map(|joint| pose.get(joint.index()).map(|lm| (joint.name(), *lm)))
        .collect()
}
