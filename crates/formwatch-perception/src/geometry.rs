//! Planar joint-angle calculator.
//!
//! Computes the interior angle at a vertex joint from two neighbouring
//! joints, e.g. the hip angle from (shoulder, hip, knee).
//!
//! ```text
//!            p1
//!           /
//!          /  θ
//!   p2 ──●──────── p3
//! ```
//!
//! The angle is `acos((a · b) / (|a| |b|))` with `a = p1 − p2` and
//! `b = p3 − p2`, the cosine clamped to `[-1, 1]` before the inverse cosine.
//!
//! # Degenerate input
//!
//! A missing point, or a limb vector of zero length, yields `0°`. Most
//! posture thresholds treat low angles as violations, so an uncomputable
//! angle is flagged rather than silently accepted. Callers must keep in mind
//! that `0°` is therefore ambiguous.
//!
//! # Example
//!
//! ```rust
//! use formwatch_perception::geometry::{joint_angle, Point2};
//!
//! let shoulder = Point2::new(0.5, 0.3);
//! let hip = Point2::new(0.5, 0.6);
//! let knee = Point2::new(0.8, 0.6);
//!
//! let deg = joint_angle(Some(shoulder), Some(hip), Some(knee));
//! assert!((deg - 90.0).abs() < 1e-9);
//! ```

use std::ops::Sub;

// ────────────────────────────────────────────────────────────────────────────
// Point2
// ────────────────────────────────────────────────────────────────────────────

/// A point in normalised image coordinates (`y` grows downwards).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A copy of this point shifted by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }
}

/// `a - b` is the vector from `b` to `a`.
impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Self) -> Self::Output {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Angle
// ────────────────────────────────────────────────────────────────────────────

/// Angle in degrees at `vertex` between the rays `vertex → p1` and
/// `vertex → p3`.
///
/// Always returns a value in `[0, 180]`. Returns `0.0` when any point is
/// absent or when `vertex` coincides with either neighbour. No rounding is
/// applied.
pub fn joint_angle(p1: Option<Point2>, vertex: Option<Point2>, p3: Option<Point2>) -> f64 {
    let (Some(p1), Some(vertex), Some(p3)) = (p1, vertex, p3) else {
        return 0.0;
    };

    let a = p1 - vertex;
    let b = p3 - vertex;
    let magnitude = a.norm() * b.norm();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return 0.0;
    }

    let cos = (a.dot(b) / magnitude).clamp(-1.0, 1.0);
    let degrees = cos.acos().to_degrees();
    if degrees.is_nan() { 0.0 } else { degrees }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Option<Point2> {
        Some(Point2::new(x, y))
    }

    #[test]
    fn right_angle() {
        let deg = joint_angle(p(0.0, 1.0), p(0.0, 0.0), p(1.0, 0.0));
        assert!((deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn collinear_points_are_straight() {
        let deg = joint_angle(p(0.5, 0.1), p(0.5, 0.3), p(0.5, 0.6));
        assert!((deg - 180.0).abs() < 1e-9);
    }

    #[test]
    fn folded_back_is_zero() {
        let deg = joint_angle(p(1.0, 0.0), p(0.0, 0.0), p(2.0, 0.0));
        assert!(deg.abs() < 1e-9);
    }

    #[test]
    fn angle_is_symmetric_in_neighbours() {
        let a = joint_angle(p(0.1, 0.2), p(0.4, 0.5), p(0.9, 0.3));
        let b = joint_angle(p(0.9, 0.3), p(0.4, 0.5), p(0.1, 0.2));
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn all_coincident_points_return_zero() {
        let deg = joint_angle(p(0.3, 0.3), p(0.3, 0.3), p(0.3, 0.3));
        assert_eq!(deg, 0.0);
    }

    #[test]
    fn vertex_on_one_neighbour_returns_zero() {
        let deg = joint_angle(p(0.3, 0.3), p(0.3, 0.3), p(0.9, 0.1));
        assert_eq!(deg, 0.0);
        let deg = joint_angle(p(0.9, 0.1), p(0.3, 0.3), p(0.3, 0.3));
        assert_eq!(deg, 0.0);
    }

    #[test]
    fn missing_point_returns_zero() {
        assert_eq!(joint_angle(None, p(0.0, 0.0), p(1.0, 0.0)), 0.0);
        assert_eq!(joint_angle(p(0.0, 1.0), None, p(1.0, 0.0)), 0.0);
        assert_eq!(joint_angle(p(0.0, 1.0), p(0.0, 0.0), None), 0.0);
    }

    #[test]
    fn near_collinear_overshoot_is_clamped() {
        // Long, almost parallel rays push the cosine past -1 in floating point.
        let deg = joint_angle(p(1e-8, 0.0), p(0.5, 0.0), p(1.0 - 1e-8, 0.0));
        assert!(!deg.is_nan());
        assert!((deg - 180.0).abs() < 1e-6);
    }

    #[test]
    fn angles_stay_within_bounds() {
        let samples = [0.0, 0.13, 0.27, 0.5, 0.71, 0.99];
        for &x1 in &samples {
            for &y1 in &samples {
                for &x3 in &samples {
                    let deg = joint_angle(p(x1, y1), p(0.42, 0.58), p(x3, 1.0 - x3));
                    assert!((0.0..=180.0).contains(&deg), "angle {deg} out of range");
                }
            }
        }
    }

    #[test]
    fn subtraction_gives_vector_between_points() {
        let v = Point2::new(0.7, 0.2) - Point2::new(0.5, 0.5);
        assert!((v.x - 0.2).abs() < 1e-12);
        assert!((v.y + 0.3).abs() < 1e-12);
    }

    #[test]
    fn offset_shifts_point() {
        let hip = Point2::new(0.5, 0.6).offset(0.0, 0.1);
        assert!((hip.y - 0.7).abs() < 1e-12);
        assert_eq!(hip.x, 0.5);
    }
}
