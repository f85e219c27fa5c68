//! Configuration records for the fitting pipeline
//!
//! Every record carries the defaults of the reference tooling and can be
//! loaded from JSON with missing fields falling back to those defaults.

use crate::ransac::RansacParams;
use serde::{Deserialize, Serialize};
use wirecrate_core::{Error, Result};

fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be a positive number, got {value}")))
    }
}

/// RANSAC line fitting of one line point cloud
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineFitConfig {
    /// RANSAC iterations
    pub iterations: usize,
    /// Maximum point-to-line distance of an inlier
    pub inlier_threshold: f64,
    /// Fits supported by fewer inliers are rejected
    pub min_inliers: usize,
}

impl Default for LineFitConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            inlier_threshold: 0.25,
            min_inliers: 5,
        }
    }
}

impl LineFitConfig {
    pub fn ransac_params(&self) -> RansacParams {
        RansacParams::new(self.iterations, self.inlier_threshold)
    }

    pub fn validate(&self) -> Result<()> {
        self.ransac_params().validate()
    }
}

/// Cross-view merge tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Per-component tolerance between unit directions (up to sign)
    pub direction_tolerance: f64,
    /// Maximum endpoint-to-line distance in either direction
    pub position_tolerance: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            direction_tolerance: 0.2,
            position_tolerance: 1.0,
        }
    }
}

impl MergeConfig {
    pub fn validate(&self) -> Result<()> {
        positive("direction_tolerance", self.direction_tolerance)?;
        positive("position_tolerance", self.position_tolerance)
    }
}

/// Per-image association and fitting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireframeConfig {
    /// Detections scoring at or below this are ignored
    pub score_threshold: f64,
    /// Maximum perpendicular pixel distance of an associated point
    pub distance: f64,
    pub line_fit: LineFitConfig,
    pub merge: MergeConfig,
    /// Color line clouds by inlier status when writing them
    pub color_inliers: bool,
}

impl Default for WireframeConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.95,
            distance: 20.0,
            line_fit: LineFitConfig::default(),
            merge: MergeConfig::default(),
            color_inliers: false,
        }
    }
}

impl WireframeConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.score_threshold.is_finite() {
            return Err(Error::InvalidConfig("score_threshold must be finite".to_string()));
        }
        positive("distance", self.distance)?;
        self.line_fit.validate()?;
        self.merge.validate()
    }
}

/// How one cluster of edges is reduced to a single representative edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMethod {
    /// Sign-aligned average direction through the least-squares intersection point
    Average,
    /// Line RANSAC over every endpoint and vertex of the cluster
    Ransac { iterations: usize, threshold: f64 },
}

/// Global clustering of a merged line set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Distance tolerance of the pointwise closeness test
    pub tolerance: f64,
    /// Groups with this many members or fewer are discarded
    pub min_group: usize,
    /// Points sampled along an edge for the closeness test
    pub samples: usize,
    /// Require closeness in both directions instead of pivot-to-candidate only
    pub symmetric: bool,
    pub consensus: ConsensusMethod,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.2,
            min_group: 3,
            samples: 10,
            symmetric: false,
            consensus: ConsensusMethod::Average,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        positive("tolerance", self.tolerance)?;
        if self.samples == 0 {
            return Err(Error::InvalidConfig("samples must be positive".to_string()));
        }
        if let ConsensusMethod::Ransac { iterations, threshold } = self.consensus {
            RansacParams::new(iterations, threshold).validate()?;
        }
        Ok(())
    }
}

/// Line graph construction and intersection grouping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Grid cells per image side used to discretize endpoints
    pub scale: f64,
    /// Detections scoring at or below this are not added to the graph
    pub score_threshold: f64,
    /// Intersections closer than this (in pixels) form one group
    pub closeness: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            scale: 128.0,
            score_threshold: 0.95,
            closeness: 1.0,
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<()> {
        positive("scale", self.scale)?;
        positive("closeness", self.closeness)
    }
}
