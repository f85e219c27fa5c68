//! Line detection files
//!
//! A detection file is a JSON list with one entry per image. Line endpoints
//! are either pixel `(x, y)` pairs or `(row, column)` pairs on the square
//! heatmap grid of the line detector.

use crate::error::{IoError, Result};
use crate::ply::open;
use serde::{Deserialize, Serialize};
use std::io::BufReader;
use std::path::Path;
use wirecrate_core::{image_number_from_name, DetectionRecord, Point2d, Segment2};

/// Side of the detector's heatmap grid
pub const HEATMAP_SIZE: f64 = 128.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCoordinates {
    /// `(x, y)` in pixels
    #[default]
    Pixels,
    /// `(row, column)` on a [`HEATMAP_SIZE`] grid spanning the image
    Heatmap,
}

/// Detector output for one image, as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetections {
    /// Image file name; its first run of digits is the image number
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub lines: Vec<[[f64; 2]; 2]>,
    pub scores: Vec<f64>,
    #[serde(default)]
    pub coordinates: LineCoordinates,
}

impl RawDetections {
    fn endpoint(&self, p: &[f64; 2]) -> Point2d {
        match self.coordinates {
            LineCoordinates::Pixels => Point2d::new(p[0], p[1]),
            LineCoordinates::Heatmap => Point2d::new(
                p[1] / HEATMAP_SIZE * self.width as f64,
                p[0] / HEATMAP_SIZE * self.height as f64,
            ),
        }
    }

    /// Convert to pixel coordinates, dropping detector padding
    pub fn into_record(self) -> Result<DetectionRecord> {
        let image_id = image_number_from_name(&self.image).ok_or_else(|| IoError::InvalidFormat {
            format: format!("image name `{}` has no number", self.image),
        })?;
        let lines = self
            .lines
            .iter()
            .map(|[a, b]| Segment2::new(self.endpoint(a), self.endpoint(b)))
            .collect();
        Ok(DetectionRecord::from_raw(image_id, self.width, self.height, lines, self.scores))
    }
}

pub fn parse_detections(json: &str) -> Result<Vec<DetectionRecord>> {
    let raw: Vec<RawDetections> = serde_json::from_str(json)?;
    raw.into_iter().map(RawDetections::into_record).collect()
}

/// Read the detection records of a detection file
pub fn read_detections<P: AsRef<Path>>(path: P) -> Result<Vec<DetectionRecord>> {
    let raw: Vec<RawDetections> = serde_json::from_reader(BufReader::new(open(path.as_ref())?))?;
    raw.into_iter().map(RawDetections::into_record).collect()
}
