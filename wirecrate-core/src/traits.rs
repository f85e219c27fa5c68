//! Core traits and bounding volumes for wirecrate

use crate::{line_set::LineSet, point::*, point_cloud::PointCloud};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with `min <= max` on every axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    /// Build a box from two arbitrary opposite corners; the corners need not be ordered.
    pub fn from_corners(a: &Point3d, b: &Point3d) -> Self {
        Self {
            min: a.inf(b),
            max: a.sup(b),
        }
    }

    /// Smallest box containing every point, `None` when there are no points
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3d>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    /// Inclusive containment test
    pub fn contains(&self, p: &Point3d) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn center(&self) -> Point3d {
        lerp(&self.min, &self.max, 0.5)
    }

    /// Edge lengths of the box along each axis
    pub fn extent(&self) -> Vector3d {
        self.max - self.min
    }
}

/// Trait for objects occupying a region of space
pub trait Drawable {
    /// Get the bounding box of the object, `None` when it holds no geometry
    fn bounding_box(&self) -> Option<BoundingBox>;

    /// Get the center point of the object
    fn center(&self) -> Option<Point3d> {
        self.bounding_box().map(|b| b.center())
    }
}

impl Drawable for PointCloud<Point3d> {
    fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.iter())
    }
}

impl Drawable for LineSet {
    fn bounding_box(&self) -> Option<BoundingBox> {
        let endpoints: Vec<Point3d> = self
            .edges()
            .iter()
            .flat_map(|e| e.endpoints())
            .collect();
        BoundingBox::from_points(self.vertices().iter().chain(endpoints.iter()))
    }
}
