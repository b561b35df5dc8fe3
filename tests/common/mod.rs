//! Shared pose fixtures for integration tests
#![allow(dead_code)]

use physique_scan::Landmark;

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_WRIST: usize = 15;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_ANKLE: usize = 27;

/// Upright front view centred on x = 0.5.
///
/// Nose at y 0.1, shoulders at y 0.25, hips at y 0.55, left wrist 0.25 below
/// the shoulder and left ankle 0.45 below the hip.
pub fn front_pose(shoulder_width: f64, hip_width: f64) -> Vec<Landmark> {
    let mut pose = vec![Landmark::new(0.5, 0.5); 33];
    pose[0] = Landmark::new(0.5, 0.1);
    pose[LEFT_SHOULDER] = Landmark::new(0.5 - shoulder_width / 2.0, 0.25);
    pose[RIGHT_SHOULDER] = Landmark::new(0.5 + shoulder_width / 2.0, 0.25);
    pose[LEFT_HIP] = Landmark::new(0.5 - hip_width / 2.0, 0.55);
    pose[RIGHT_HIP] = Landmark::new(0.5 + hip_width / 2.0, 0.55);
    pose[LEFT_WRIST] = Landmark::new(0.5 - shoulder_width / 2.0, 0.5);
    pose[LEFT_ANKLE] = Landmark::new(0.5 - hip_width / 2.0, 1.0);
    pose
}

/// The reference male front view: shoulder/hip ratio 4/3
pub fn reference_front() -> Vec<Landmark> {
    front_pose(0.4, 0.3)
}

/// Side view with every joint on the same vertical line
pub fn aligned_side() -> Vec<Landmark> {
    vec![Landmark::new(0.5, 0.5); 33]
}
