//! Line point clouds and the 3D lines fitted to them

use crate::line_set::{EdgeLabel, LineSet};
use crate::point::*;
use crate::point_cloud::PointCloud3d;
use crate::segment::Segment;

/// A 3D segment fitted to a line point cloud, with the perpendicular error of
/// every point of that cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLine {
    pub segment: Segment,
    pub inlier_count: usize,
    pub errors: Vec<f64>,
}

impl FittedLine {
    /// Fit with errors computed against the segment's infinite line
    pub fn from_segment(segment: Segment, inlier_count: usize, cloud: &[Point3d]) -> Self {
        let errors = cloud.iter().map(|p| segment.distance_to_line(p)).collect();
        Self {
            segment,
            inlier_count,
            errors,
        }
    }
}

/// The 3D points associated with one detected line, and the line fitted to them.
///
/// `line` is `None` when the cloud had too few inliers to fit. `labels` holds the
/// `(image, line)` provenance of every detection merged into this observation.
/// `stale` marks a line whose endpoints were kept from before a merge because
/// refitting the merged cloud failed.
#[derive(Debug, Clone, PartialEq)]
pub struct LineObservation {
    pub cloud: PointCloud3d,
    pub line: Option<FittedLine>,
    pub labels: Vec<EdgeLabel>,
    pub stale: bool,
}

impl LineObservation {
    pub fn new(cloud: PointCloud3d, line: Option<FittedLine>, label: EdgeLabel) -> Self {
        Self {
            cloud,
            line,
            labels: vec![label],
            stale: false,
        }
    }

    pub fn segment(&self) -> Option<&Segment> {
        self.line.as_ref().map(|l| &l.segment)
    }

    pub fn has_line(&self) -> bool {
        self.line.is_some()
    }

    /// First provenance label, the sentinel when there is none
    pub fn label(&self) -> EdgeLabel {
        self.labels.first().copied().unwrap_or_default()
    }

    /// Per-point colors: white for inliers of the fitted line, red for outliers
    /// and for every point of an unfitted cloud.
    pub fn inlier_colors(&self, threshold: f64) -> Vec<Color> {
        match &self.line {
            Some(line) => line
                .errors
                .iter()
                .map(|&e| if e < threshold { WHITE } else { RED })
                .collect(),
            None => vec![RED; self.cloud.len()],
        }
    }

    /// The cloud as free vertices plus the fitted segment, if any, as the single edge
    pub fn to_line_set(&self) -> LineSet {
        let mut set = LineSet::from_vertices(self.cloud.points.clone());
        if let Some(segment) = self.segment() {
            set.push_edge(*segment, self.label());
        }
        set
    }
}
