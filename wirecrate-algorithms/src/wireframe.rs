//! Per-image line reconstruction
//!
//! An [`ImageWireframe`] owns the line observations recovered from one image:
//! the shot's 3D points are projected, associated with each confident
//! detection, and a 3D line is fitted to every association.

use crate::association::associate_lines;
use crate::config::WireframeConfig;
use crate::line_fit::fit_line;
use crate::merge::merge_until_stable;
use rand::Rng;
use wirecrate_core::{
    project_points, Camera, CameraPose, Color, DetectionRecord, EdgeLabel, LineObservation, LineSet, Point3d,
    Result, Segment2,
};

/// Line observations of one image, or of several images after [`ImageWireframe::combine`]
#[derive(Debug, Clone)]
pub struct ImageWireframe {
    image_id: i32,
    lines: Vec<Segment2>,
    observations: Vec<LineObservation>,
    config: WireframeConfig,
}

impl ImageWireframe {
    /// Reconstruct the lines of `record` seen by `camera` at `pose`.
    ///
    /// Observation `i` corresponds to the `i`-th detection scoring above the
    /// threshold and is labelled `(record.image_id, i)`.
    pub fn build<R: Rng + ?Sized>(
        record: &DetectionRecord,
        camera: &Camera,
        pose: &CameraPose,
        points: &[Point3d],
        config: &WireframeConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;

        let (lines, _) = record.filtered(config.score_threshold);
        let projected = project_points(camera, pose, points);
        let clouds = associate_lines(points, &projected, &lines, config.distance);

        let observations: Vec<LineObservation> = clouds
            .into_iter()
            .enumerate()
            .map(|(i, cloud)| {
                let line = fit_line(cloud.points.as_slice(), &config.line_fit, rng);
                LineObservation::new(cloud.points, line, EdgeLabel::new(record.image_id, i as i32))
            })
            .collect();

        let fitted = observations.iter().filter(|o| o.has_line()).count();
        log::info!(
            "image {}: {} of {} detections kept, {} projected points, {} lines fitted",
            record.image_id,
            lines.len(),
            record.len(),
            projected.len(),
            fitted
        );

        Ok(Self {
            image_id: record.image_id,
            lines,
            observations,
            config: *config,
        })
    }

    pub fn image_id(&self) -> i32 {
        self.image_id
    }

    /// The detections that passed the score threshold
    pub fn lines(&self) -> &[Segment2] {
        &self.lines
    }

    pub fn observations(&self) -> &[LineObservation] {
        &self.observations
    }

    pub fn config(&self) -> &WireframeConfig {
        &self.config
    }

    pub fn fitted_count(&self) -> usize {
        self.observations.iter().filter(|o| o.has_line()).count()
    }

    /// One line set per observation: its cloud as vertices and its fitted
    /// segment, if any, as the single edge.
    pub fn line_sets(&self) -> Vec<LineSet> {
        self.observations.iter().map(LineObservation::to_line_set).collect()
    }

    /// Vertex colors for observation `index` when inlier coloring is enabled
    pub fn vertex_colors(&self, index: usize) -> Option<Vec<Color>> {
        if !self.config.color_inliers {
            return None;
        }
        self.observations
            .get(index)
            .map(|o| o.inlier_colors(self.config.line_fit.inlier_threshold))
    }

    /// Every fitted segment as one labelled line set
    pub fn wireframe(&self) -> LineSet {
        self.observations
            .iter()
            .filter_map(|o| o.segment().map(|s| (*s, o.label())))
            .collect()
    }

    /// Take over the observations of `other` and merge until stable.
    ///
    /// Returns the number of merge passes run.
    pub fn combine<R: Rng + ?Sized>(&mut self, other: ImageWireframe, rng: &mut R) -> usize {
        let mut observations = std::mem::take(&mut self.observations);
        observations.extend(other.observations);
        self.lines.extend(other.lines);

        let (merged, passes) = merge_until_stable(observations, &self.config.merge, &self.config.line_fit, rng);
        log::debug!("combined image {} into image {}: {} observations", other.image_id, self.image_id, merged.len());
        self.observations = merged;
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wirecrate_core::{Point2d, Vector3d, RED, WHITE};

    fn camera() -> Camera {
        Camera {
            width: 101,
            height: 101,
            focal: 1.0,
            k1: 0.0,
            k2: 0.0,
        }
    }

    /// Points on the 3D line y = 0, z = 10 plus one stray point
    fn points() -> Vec<Point3d> {
        let mut points: Vec<Point3d> = (0..20).map(|i| Point3d::new(-4.0 + 0.4 * i as f64, 0.0, 10.0)).collect();
        points.push(Point3d::new(0.0, 0.5, 10.0));
        points
    }

    fn record(image_id: i32) -> DetectionRecord {
        // Projects to the horizontal image line through the principal point
        let line = Segment2::new(Point2d::new(0.0, 50.0), Point2d::new(100.0, 50.0));
        let weak = Segment2::new(Point2d::new(0.0, 0.0), Point2d::new(100.0, 100.0));
        DetectionRecord::from_raw(image_id, 101, 101, vec![line, weak], vec![0.99, 0.3])
    }

    #[test]
    fn test_build_fits_detected_line() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = WireframeConfig {
            color_inliers: true,
            ..Default::default()
        };
        let wf = ImageWireframe::build(&record(2), &camera(), &CameraPose::identity(), &points(), &config, &mut rng)
            .unwrap();

        assert_eq!(wf.lines().len(), 1);
        assert_eq!(wf.fitted_count(), 1);
        let obs = &wf.observations()[0];
        assert_eq!(obs.cloud.len(), 21);
        assert_eq!(obs.label(), EdgeLabel::new(2, 0));

        let colors = wf.vertex_colors(0).unwrap();
        assert!(colors[..20].iter().all(|c| *c == WHITE));
        assert_eq!(colors[20], RED);

        let sets = wf.line_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].edge_count(), 1);
        assert_eq!(sets[0].vertices().len(), 21);
    }

    #[test]
    fn test_colors_disabled_by_default() {
        let mut rng = StdRng::seed_from_u64(3);
        let wf = ImageWireframe::build(
            &record(0),
            &camera(),
            &CameraPose::identity(),
            &points(),
            &WireframeConfig::default(),
            &mut rng,
        )
        .unwrap();
        assert!(wf.vertex_colors(0).is_none());
    }

    #[test]
    fn test_unfitted_cloud_is_all_red() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = WireframeConfig {
            color_inliers: true,
            ..Default::default()
        };
        let sparse: Vec<Point3d> = points().into_iter().take(3).collect();
        let wf = ImageWireframe::build(&record(0), &camera(), &CameraPose::identity(), &sparse, &config, &mut rng)
            .unwrap();
        assert_eq!(wf.fitted_count(), 0);
        assert_eq!(wf.vertex_colors(0).unwrap(), vec![RED; 3]);
    }

    #[test]
    fn test_combine_merges_views() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = WireframeConfig::default();
        let pts = points();
        let mut first =
            ImageWireframe::build(&record(0), &camera(), &CameraPose::identity(), &pts, &config, &mut rng).unwrap();
        // Same line from a camera shifted along x
        let shifted = CameraPose::new(Vector3d::zeros(), Vector3d::new(0.5, 0.0, 0.0));
        let second = ImageWireframe::build(&record(1), &camera(), &shifted, &pts, &config, &mut rng).unwrap();

        let passes = first.combine(second, &mut rng);
        assert_eq!(passes, 2);
        assert_eq!(first.observations().len(), 1);
        assert_eq!(first.observations()[0].labels, vec![EdgeLabel::new(0, 0), EdgeLabel::new(1, 0)]);
        assert_eq!(first.wireframe().edge_count(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = WireframeConfig {
            distance: -1.0,
            ..Default::default()
        };
        assert!(ImageWireframe::build(&record(0), &camera(), &CameraPose::identity(), &points(), &config, &mut rng)
            .is_err());
    }
}
