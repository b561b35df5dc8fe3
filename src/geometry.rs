//! Planar geometry over pose landmarks.
//!
//! All measurements use the image plane only; `z` is ignored.

use crate::models::Landmark;

/// Euclidean distance between two landmarks in the (x, y) plane
#[must_use]
pub fn distance(p1: &Landmark, p2: &Landmark) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    dx.hypot(dy)
}

/// Angle at `p2` formed by `p1 - p2 - p3`, in degrees.
///
/// Returns 0 when either arm of the angle has zero length.
#[must_use]
pub fn angle(p1: &Landmark, p2: &Landmark, p3: &Landmark) -> f64 {
    let v1 = (p1.x - p2.x, p1.y - p2.y);
    let v2 = (p3.x - p2.x, p3.y - p2.y);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = v1.0.hypot(v1.1);
    let mag2 = v2.0.hypot(v2.1);

    if mag1 * mag2 == 0.0 {
        return 0.0;
    }

    // Rounding can push the cosine just outside acos' domain
    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Point halfway between two landmarks
#[must_use]
pub fn midpoint(a: &Landmark, b: &Landmark) -> Landmark {
    Landmark {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
        z: (a.z + b.z) / 2.0,
        visibility: a.visibility.min(b.visibility),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_ignores_depth() {
        let a = Landmark { x: 0.0, y: 0.0, z: 5.0, visibility: 1.0 };
        let b = Landmark { x: 3.0, y: 4.0, z: -2.0, visibility: 1.0 };
        assert!((distance(&a, &b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_right_angle() {
        let a = Landmark::new(1.0, 0.0);
        let vertex = Landmark::new(0.0, 0.0);
        let c = Landmark::new(0.0, 1.0);
        assert!((angle(&a, &vertex, &c) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_angle_is_clamped() {
        let a = Landmark::new(-0.3, 0.1);
        let vertex = Landmark::new(0.0, 0.1);
        let c = Landmark::new(0.7, 0.1);
        let degrees = angle(&a, &vertex, &c);
        assert!((degrees - 180.0).abs() < 1e-9);
        assert!(!degrees.is_nan());
    }

    #[test]
    fn test_degenerate_angle_is_zero() {
        let p = Landmark::new(0.5, 0.5);
        let q = Landmark::new(0.9, 0.1);
        assert!(angle(&p, &p, &q).abs() < f64::EPSILON);
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(&Landmark::new(0.2, 0.8), &Landmark::new(0.6, 0.9));
        assert!((m.x - 0.4).abs() < 1e-12);
        assert!((m.y - 0.85).abs() < 1e-12);
    }
}
