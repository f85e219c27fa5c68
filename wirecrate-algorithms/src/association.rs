//! Association of projected 3D points with detected 2D lines

use rayon::prelude::*;
use wirecrate_core::{Point2d, Point3d, PointCloud3d, ProjectedPoints, Segment2};

/// Indices of the image points close to `line`.
///
/// A point qualifies when its perpendicular distance to the line is strictly
/// below `distance` and its projection onto the segment falls strictly
/// between the endpoints. A degenerate line has no neighbours.
pub fn points_near_line(points: &[Point2d], line: &Segment2, distance: f64) -> Vec<usize> {
    let Some(normal) = line.normal() else {
        return Vec::new();
    };
    let along = line.vector();
    let extent = line.length_squared();

    points
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            let rel = *p - line.start;
            let t = along.dot(&rel);
            normal.dot(&rel).abs() < distance && t > 0.0 && t < extent
        })
        .map(|(i, _)| i)
        .collect()
}

/// The 3D points whose projections lie near one detected line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinePointCloud {
    /// Indices into the original 3D points
    pub indices: Vec<usize>,
    pub points: PointCloud3d,
}

impl LinePointCloud {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Collect the 3D points associated with `line`, mapping image indices back
/// through `projected.source_indices`.
pub fn line_point_cloud(
    points: &[Point3d],
    projected: &ProjectedPoints,
    line: &Segment2,
    distance: f64,
) -> LinePointCloud {
    let indices: Vec<usize> = points_near_line(&projected.image_points, line, distance)
        .into_iter()
        .map(|i| projected.source_indices[i])
        .collect();
    let points = indices.iter().map(|&i| points[i]).collect();
    LinePointCloud { indices, points }
}

/// One [`LinePointCloud`] per line, in line order, computed in parallel
pub fn associate_lines(
    points: &[Point3d],
    projected: &ProjectedPoints,
    lines: &[Segment2],
    distance: f64,
) -> Vec<LinePointCloud> {
    lines
        .par_iter()
        .map(|line| line_point_cloud(points, projected, line, distance))
        .collect()
}
