//! Pinhole camera with two-term radial distortion

use crate::point::*;
use nalgebra::{Isometry3, Matrix3};
use serde::{Deserialize, Serialize};

/// Intrinsic parameters of a perspective camera.
///
/// `focal` is normalized by the larger image dimension, as structure-from-motion
/// toolkits usually store it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub width: u32,
    pub height: u32,
    pub focal: f64,
    #[serde(default)]
    pub k1: f64,
    #[serde(default)]
    pub k2: f64,
}

impl Camera {
    /// Focal length in pixels
    pub fn focal_pixels(&self) -> f64 {
        self.focal * self.width.max(self.height) as f64
    }

    /// Principal point at the image center
    pub fn principal_point(&self) -> Point2d {
        Point2d::new(
            0.5 * (self.width as f64 - 1.0),
            0.5 * (self.height as f64 - 1.0),
        )
    }

    /// Intrinsic matrix `K`
    pub fn intrinsics(&self) -> Matrix3<f64> {
        let f = self.focal_pixels();
        let c = self.principal_point();
        #[rustfmt::skip]
        let k = Matrix3::new(
            f, 0.0, c.x,
            0.0, f, c.y,
            0.0, 0.0, 1.0,
        );
        k
    }

    /// Map a point in camera coordinates to pixel coordinates.
    ///
    /// Points on or behind the image plane have no projection.
    pub fn project_camera_point(&self, p: &Point3d) -> Option<Point2d> {
        if p.z <= EPSILON {
            return None;
        }
        let x = p.x / p.z;
        let y = p.y / p.z;
        let r2 = x * x + y * y;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2;
        let f = self.focal_pixels();
        let c = self.principal_point();
        Some(Point2d::new(f * x * radial + c.x, f * y * radial + c.y))
    }
}

/// World-to-camera pose: `x_cam = R * x_world + t`, with `R` given as an axis-angle vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub rotation: Vector3d,
    pub translation: Vector3d,
}

impl CameraPose {
    pub fn new(rotation: Vector3d, translation: Vector3d) -> Self {
        Self { rotation, translation }
    }

    pub fn identity() -> Self {
        Self::new(Vector3d::zeros(), Vector3d::zeros())
    }

    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::new(self.translation, self.rotation)
    }
}

/// Image projections of a subset of a 3D point set.
///
/// `source_indices[i]` is the index in the original 3D points of `image_points[i]`;
/// points that could not be projected are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedPoints {
    pub image_points: Vec<Point2d>,
    pub source_indices: Vec<usize>,
}

impl ProjectedPoints {
    pub fn len(&self) -> usize {
        self.image_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_points.is_empty()
    }
}

/// Project world points into the image of `camera` placed at `pose`
pub fn project_points(camera: &Camera, pose: &CameraPose, points: &[Point3d]) -> ProjectedPoints {
    let iso = pose.isometry();
    let mut projected = ProjectedPoints::default();
    for (i, p) in points.iter().enumerate() {
        if let Some(uv) = camera.project_camera_point(&iso.transform_point(p)) {
            projected.image_points.push(uv);
            projected.source_indices.push(i);
        }
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera {
            width: 641,
            height: 481,
            focal: 1.0,
            k1: 0.0,
            k2: 0.0,
        }
    }

    #[test]
    fn test_intrinsics() {
        let k = camera().intrinsics();
        assert_relative_eq!(k[(0, 0)], 641.0);
        assert_relative_eq!(k[(1, 1)], 641.0);
        assert_relative_eq!(k[(0, 2)], 320.0);
        assert_relative_eq!(k[(1, 2)], 240.0);
    }

    #[test]
    fn test_optical_axis_hits_principal_point() {
        let projected = project_points(&camera(), &CameraPose::identity(), &[Point3d::new(0.0, 0.0, 5.0)]);
        assert_eq!(projected.source_indices, vec![0]);
        assert_relative_eq!(projected.image_points[0], Point2d::new(320.0, 240.0), epsilon = 1e-9);
    }

    #[test]
    fn test_points_behind_camera_are_skipped() {
        let points = [
            Point3d::new(0.0, 0.0, -1.0),
            Point3d::new(1.0, 0.0, 2.0),
        ];
        let projected = project_points(&camera(), &CameraPose::identity(), &points);
        assert_eq!(projected.source_indices, vec![1]);
        assert_relative_eq!(projected.image_points[0].x, 320.0 + 641.0 * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_radial_distortion_and_translation() {
        let cam = Camera { k1: 0.1, k2: 0.01, ..camera() };
        let pose = CameraPose::new(Vector3d::zeros(), Vector3d::new(0.0, 0.0, 1.0));
        // Camera-frame point (1, 0, 2): x = 0.5, r2 = 0.25
        let p = cam.project_camera_point(&Point3d::new(1.0, 0.0, 2.0)).unwrap();
        let radial = 1.0 + 0.1 * 0.25 + 0.01 * 0.0625;
        assert_relative_eq!(p.x, 641.0 * 0.5 * radial + 320.0, epsilon = 1e-9);

        let projected = project_points(&cam, &pose, &[Point3d::new(1.0, 0.0, 1.0)]);
        assert_relative_eq!(projected.image_points[0], p, epsilon = 1e-9);
    }
}
