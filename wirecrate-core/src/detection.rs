//! 2D line detections produced for one image

use crate::segment::Segment2;
use serde::{Deserialize, Serialize};

/// Line detections for one image: endpoints in pixel `(x, y)` coordinates,
/// one confidence score per line, and the image dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub image_id: i32,
    pub width: u32,
    pub height: u32,
    pub lines: Vec<Segment2>,
    pub scores: Vec<f64>,
}

impl DetectionRecord {
    /// Build a record from raw detector output.
    ///
    /// Detectors pad their fixed-size output by repeating the first line, so
    /// the lists are cut at the first exact repeat of line 0.
    pub fn from_raw(image_id: i32, width: u32, height: u32, lines: Vec<Segment2>, scores: Vec<f64>) -> Self {
        let mut count = lines.len().min(scores.len());
        if let Some(first) = lines.first() {
            if let Some(pos) = lines.iter().skip(1).position(|l| l == first) {
                count = count.min(pos + 1);
            }
        }
        let mut lines = lines;
        let mut scores = scores;
        lines.truncate(count);
        scores.truncate(count);
        Self {
            image_id,
            width,
            height,
            lines,
            scores,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines and scores whose score is strictly above `threshold`
    pub fn filtered(&self, threshold: f64) -> (Vec<Segment2>, Vec<f64>) {
        self.lines
            .iter()
            .zip(&self.scores)
            .filter(|(_, s)| **s > threshold)
            .map(|(l, s)| (*l, *s))
            .unzip()
    }
}

/// The first run of decimal digits in an image name, e.g. `img_42.png -> 42`
pub fn image_number_from_name(name: &str) -> Option<i32> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let rest = &name[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point2d;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment2 {
        Segment2::new(Point2d::new(x0, y0), Point2d::new(x1, y1))
    }

    #[test]
    fn test_from_raw_truncates_padding() {
        let lines = vec![
            line(0.0, 0.0, 1.0, 1.0),
            line(2.0, 2.0, 3.0, 3.0),
            line(0.0, 0.0, 1.0, 1.0),
            line(2.0, 2.0, 3.0, 3.0),
        ];
        let record = DetectionRecord::from_raw(7, 640, 480, lines, vec![0.99, 0.5, 0.99, 0.5]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.scores, vec![0.99, 0.5]);
    }

    #[test]
    fn test_filtered_is_strict() {
        let record = DetectionRecord::from_raw(
            0,
            10,
            10,
            vec![line(0.0, 0.0, 1.0, 0.0), line(0.0, 1.0, 1.0, 1.0), line(0.0, 2.0, 1.0, 2.0)],
            vec![0.95, 0.96, 0.2],
        );
        let (lines, scores) = record.filtered(0.95);
        assert_eq!(lines, vec![line(0.0, 1.0, 1.0, 1.0)]);
        assert_eq!(scores, vec![0.96]);
    }

    #[test]
    fn test_image_number_from_name() {
        assert_eq!(image_number_from_name("img_42.png"), Some(42));
        assert_eq!(image_number_from_name("IMG_0917.jpg"), Some(917));
        assert_eq!(image_number_from_name("frame12_v3.png"), Some(12));
        assert_eq!(image_number_from_name("cover.png"), None);
    }
}
