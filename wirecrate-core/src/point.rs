//! Point types and related functionality

use nalgebra::{Point2, Point3, Vector2, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// A 2D image-plane point
pub type Point2d = Point2<f64>;

/// A 2D image-plane vector
pub type Vector2d = Vector2<f64>;

/// RGB color attached to serialized vertices and edges
pub type Color = [u8; 3];

/// Default color for vertices, edges and inliers
pub const WHITE: Color = [255, 255, 255];

/// Color used to mark outliers and unfitted clouds
pub const RED: Color = [255, 0, 0];

/// Numerical tolerance below which a vector is treated as zero-length
pub const EPSILON: f64 = 1e-12;

/// Linear interpolation between two points, `t` in `[0, 1]`
pub fn lerp(a: &Point3d, b: &Point3d, t: f64) -> Point3d {
    a + (b - a) * t
}

/// Arithmetic mean of a set of points, `None` when empty
pub fn centroid(points: &[Point3d]) -> Option<Point3d> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vector3d::zeros(), |acc, p| acc + p.coords);
    Some(Point3d::from(sum / points.len() as f64))
}
