//! Line segment types in 3D space and in the image plane

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A 3D line segment ("edge") between two points.
///
/// The direction is always derived from the endpoints on demand, so a
/// segment never carries a stale direction after its endpoints change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point3d,
    pub end: Point3d,
}

impl Segment {
    /// Create a segment from two endpoints
    pub fn new(start: Point3d, end: Point3d) -> Self {
        Self { start, end }
    }

    /// Vector from `start` to `end`
    pub fn vector(&self) -> Vector3d {
        self.end - self.start
    }

    /// Euclidean length of the segment
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Unit direction from `start` to `end`, `None` when the endpoints coincide
    pub fn direction(&self) -> Option<Vector3d> {
        let v = self.vector();
        let norm = v.norm();
        if norm < EPSILON {
            return None;
        }
        Some(v / norm)
    }

    /// The same segment with its endpoints swapped
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    /// Midpoint of the segment
    pub fn midpoint(&self) -> Point3d {
        lerp(&self.start, &self.end, 0.5)
    }

    /// Point at parameter `t` of the segment, `t = 0` is `start` and `t = 1` is `end`
    pub fn point_at(&self, t: f64) -> Point3d {
        lerp(&self.start, &self.end, t)
    }

    /// Signed distance of the projection of `point` along the unit direction, measured from `start`
    pub fn project(&self, point: &Point3d) -> Option<f64> {
        self.direction().map(|d| d.dot(&(point - self.start)))
    }

    /// Perpendicular distance from `point` to the infinite line through this segment.
    ///
    /// Degenerate segments have no line, so every point is infinitely far away.
    pub fn distance_to_line(&self, point: &Point3d) -> f64 {
        match self.direction() {
            Some(d) => d.cross(&(point - self.start)).norm(),
            None => f64::INFINITY,
        }
    }

    /// Cross-product parallelism test: `|d1 x d2| < tolerance`
    pub fn is_parallel(&self, other: &Segment, tolerance: f64) -> bool {
        match (self.direction(), other.direction()) {
            (Some(d1), Some(d2)) => d1.cross(&d2).norm() < tolerance,
            _ => false,
        }
    }

    /// Component-wise direction test: the unit directions agree up to sign
    /// within `tolerance` on every axis.
    pub fn is_aligned(&self, other: &Segment, tolerance: f64) -> bool {
        match (self.direction(), other.direction()) {
            (Some(d1), Some(d2)) => {
                let close = |a: &Vector3d, b: &Vector3d| {
                    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tolerance)
                };
                close(&d1, &d2) || close(&d1, &-d2)
            }
            _ => false,
        }
    }

    /// `count` evenly spaced points from `start` to `end` inclusive
    pub fn sample_points(&self, count: usize) -> impl Iterator<Item = Point3d> + '_ {
        let steps = count.saturating_sub(1).max(1) as f64;
        (0..count).map(move |i| self.point_at(i as f64 / steps))
    }

    /// Pointwise closeness: every one of `samples` interpolated points of this
    /// segment lies within `tolerance` of `other`'s infinite line.
    pub fn is_close_to(&self, other: &Segment, tolerance: f64, samples: usize) -> bool {
        self.sample_points(samples)
            .all(|p| other.distance_to_line(&p) <= tolerance)
    }

    /// Both endpoints as an array
    pub fn endpoints(&self) -> [Point3d; 2] {
        [self.start, self.end]
    }
}

/// A 2D line segment in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment2 {
    pub start: Point2d,
    pub end: Point2d,
}

impl Segment2 {
    pub fn new(start: Point2d, end: Point2d) -> Self {
        Self { start, end }
    }

    pub fn vector(&self) -> Vector2d {
        self.end - self.start
    }

    pub fn length_squared(&self) -> f64 {
        self.vector().norm_squared()
    }

    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Unit direction, `None` for a zero-length segment
    pub fn direction(&self) -> Option<Vector2d> {
        let v = self.vector();
        let norm = v.norm();
        if norm < EPSILON {
            return None;
        }
        Some(v / norm)
    }

    /// Unit normal, the direction rotated by +90 degrees
    pub fn normal(&self) -> Option<Vector2d> {
        self.direction().map(|d| Vector2d::new(-d.y, d.x))
    }

    /// The same segment with its endpoints swapped
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direction_is_unit_and_antisymmetric() {
        let a = Point3d::new(1.0, -2.0, 0.5);
        let b = Point3d::new(4.0, 2.0, 0.5);
        let forward = Segment::new(a, b).direction().unwrap();
        let backward = Segment::new(b, a).direction().unwrap();

        assert_relative_eq!(forward.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(forward, -backward, epsilon = 1e-12);
        assert_relative_eq!(forward, Vector3d::new(0.6, 0.8, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_direction() {
        let p = Point3d::new(1.0, 1.0, 1.0);
        let segment = Segment::new(p, p);
        assert!(segment.direction().is_none());
        assert_eq!(segment.distance_to_line(&Point3d::origin()), f64::INFINITY);
        assert!(!segment.is_parallel(&segment, 0.1));
    }

    #[test]
    fn test_distance_to_line() {
        let segment = Segment::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(1.0, 0.0, 0.0));
        // Beyond the endpoints the distance is still measured to the infinite line
        assert_relative_eq!(segment.distance_to_line(&Point3d::new(5.0, 3.0, 4.0)), 5.0, epsilon = 1e-12);
        assert_relative_eq!(segment.distance_to_line(&Point3d::new(-2.0, 0.0, 0.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_and_aligned() {
        let x = Segment::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(1.0, 0.0, 0.0));
        let x_reversed = Segment::new(Point3d::new(3.0, 1.0, 0.0), Point3d::new(-1.0, 1.0, 0.0));
        let y = Segment::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(0.0, 1.0, 0.0));

        assert!(x.is_parallel(&x_reversed, 0.1));
        assert!(x.is_aligned(&x_reversed, 0.1));
        assert!(!x.is_parallel(&y, 0.1));
        assert!(!x.is_aligned(&y, 0.1));
    }

    #[test]
    fn test_close_segments() {
        let a = Segment::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(10.0, 0.0, 0.0));
        let b = Segment::new(Point3d::new(2.0, 0.1, 0.0), Point3d::new(8.0, 0.1, 0.0));
        let c = Segment::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(10.0, 2.0, 0.0));

        assert!(b.is_close_to(&a, 0.2, 10));
        assert!(a.is_close_to(&b, 0.2, 10));
        assert!(!c.is_close_to(&a, 0.2, 10));
    }

    #[test]
    fn test_sample_points_inclusive() {
        let s = Segment::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(0.0, 0.0, 9.0));
        let pts: Vec<_> = s.sample_points(10).collect();
        assert_eq!(pts.len(), 10);
        assert_relative_eq!(pts[0], s.start);
        assert_relative_eq!(pts[9], s.end);
        assert_relative_eq!(pts[3].z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_segment2_normal() {
        let s = Segment2::new(Point2d::new(0.0, 0.0), Point2d::new(2.0, 0.0));
        assert_relative_eq!(s.normal().unwrap(), Vector2d::new(0.0, 1.0));
        assert_relative_eq!(s.length_squared(), 4.0);
        assert!(Segment2::new(Point2d::origin(), Point2d::origin()).normal().is_none());
    }
}
