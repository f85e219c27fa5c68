//! Robust 3D line fitting

use crate::config::LineFitConfig;
use crate::ransac::{Estimator, Ransac};
use itertools::Itertools;
use nalgebra::Matrix3;
use rand::Rng;
use wirecrate_core::{centroid, FittedLine, Point3d, Segment, EPSILON};

/// Principal-direction segment through `points`.
///
/// The line passes through the mean along the dominant singular vector of the
/// scatter matrix; the endpoints are the extreme projections of the points
/// onto it. Returns `None` when the points are empty or coincide.
pub fn principal_segment(points: &[Point3d]) -> Option<Segment> {
    let mean = centroid(points)?;

    let scatter = points.iter().fold(Matrix3::zeros(), |acc, p| {
        let d = p - mean;
        acc + d * d.transpose()
    });

    let svd = scatter.svd(true, false);
    let u = svd.u?;
    let (axis, largest) = svd.singular_values.argmax();
    if largest < EPSILON {
        return None;
    }
    let direction = u.column(axis).normalize();

    let (min_t, max_t) = points
        .iter()
        .map(|p| direction.dot(&(p - mean)))
        .minmax()
        .into_option()?;

    Some(Segment::new(mean + direction * min_t, mean + direction * max_t))
}

/// Line model for RANSAC: two samples, error is the distance to the infinite line
#[derive(Debug, Clone, Copy, Default)]
pub struct Line3dEstimator;

impl Estimator for Line3dEstimator {
    type Datum = Point3d;
    type Model = Segment;
    const SAMPLE_SIZE: usize = 2;

    fn fit(&self, samples: &[Point3d]) -> Option<Segment> {
        principal_segment(samples)
    }

    fn error(&self, datum: &Point3d, model: &Segment) -> f64 {
        model.distance_to_line(datum)
    }
}

/// Fit a line to one line point cloud.
///
/// Returns `None` when RANSAC finds no model or the model has fewer than
/// `config.min_inliers` inliers.
pub fn fit_line<R: Rng + ?Sized>(cloud: &[Point3d], config: &LineFitConfig, rng: &mut R) -> Option<FittedLine> {
    let ransac = Ransac::new(Line3dEstimator, config.ransac_params());
    let result = ransac.run(cloud, rng);
    let inlier_count = result.inlier_count();
    if inlier_count < config.min_inliers {
        return None;
    }
    result
        .model
        .map(|segment| FittedLine::from_segment(segment, inlier_count, cloud))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn noisy_line(rng: &mut StdRng) -> Vec<Point3d> {
        let mut points: Vec<Point3d> = (0..=20)
            .map(|i| {
                let x = i as f64 * 0.5;
                Point3d::new(x, rng.gen_range(-0.02..0.02), rng.gen_range(-0.02..0.02))
            })
            .collect();
        points.push(Point3d::new(3.0, 4.0, 0.0));
        points.push(Point3d::new(7.0, -5.0, 2.0));
        points
    }

    #[test]
    fn test_principal_segment_spans_points() {
        let points = vec![
            Point3d::new(1.0, 1.0, 1.0),
            Point3d::new(3.0, 3.0, 3.0),
            Point3d::new(2.0, 2.0, 2.0),
        ];
        let segment = principal_segment(&points).unwrap();
        let ends = [segment.start, segment.end];
        assert!(ends.iter().any(|p| (p - Point3d::new(1.0, 1.0, 1.0)).norm() < 1e-9));
        assert!(ends.iter().any(|p| (p - Point3d::new(3.0, 3.0, 3.0)).norm() < 1e-9));
    }

    #[test]
    fn test_coincident_points_are_degenerate() {
        let p = Point3d::new(1.0, 2.0, 3.0);
        assert!(principal_segment(&[p, p]).is_none());
        assert!(principal_segment(&[]).is_none());
    }

    #[test]
    fn test_fit_line_rejects_outliers() {
        let mut rng = StdRng::seed_from_u64(11);
        let cloud = noisy_line(&mut rng);
        let line = fit_line(&cloud, &LineFitConfig::default(), &mut rng).unwrap();

        assert_eq!(line.inlier_count, 21);
        assert_eq!(line.errors.len(), cloud.len());
        let d = line.segment.direction().unwrap();
        assert_relative_eq!(d.x.abs(), 1.0, epsilon = 1e-2);
        assert_relative_eq!(line.segment.length(), 10.0, epsilon = 0.1);
        assert!(line.errors[21] > 1.0 && line.errors[22] > 1.0);
    }

    #[test]
    fn test_fit_line_min_inliers_gate() {
        let mut rng = StdRng::seed_from_u64(5);
        let cloud: Vec<Point3d> = (0..4).map(|i| Point3d::new(i as f64, 0.0, 0.0)).collect();
        assert!(fit_line(&cloud, &LineFitConfig::default(), &mut rng).is_none());

        let config = LineFitConfig {
            min_inliers: 4,
            ..Default::default()
        };
        assert!(fit_line(&cloud, &config, &mut rng).is_some());
    }

    #[test]
    fn test_fit_line_on_tiny_cloud() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = LineFitConfig {
            min_inliers: 0,
            ..Default::default()
        };
        assert!(fit_line(&[Point3d::origin()], &config, &mut rng).is_none());
    }
}
