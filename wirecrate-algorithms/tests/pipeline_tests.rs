//! Integration tests for wirecrate-algorithms
//!
//! A synthetic scene of two 3D lines is observed by two cameras; detections
//! are the exact projections of the lines. The tests run the per-image
//! reconstruction, the cross-view merge, and the global clustering together.

use rand::rngs::StdRng;
use rand::SeedableRng;
use wirecrate_algorithms::*;
use wirecrate_core::{
    project_points, Camera, CameraPose, DetectionRecord, EdgeLabel, Point3d, Segment, Segment2, Vector3d,
};

fn camera() -> Camera {
    Camera {
        width: 640,
        height: 480,
        focal: 1.0,
        k1: 0.0,
        k2: 0.0,
    }
}

fn scene_lines() -> [Segment; 2] {
    [
        Segment::new(Point3d::new(-2.0, -1.0, 10.0), Point3d::new(2.0, -1.0, 10.0)),
        Segment::new(Point3d::new(2.5, 0.0, 10.0), Point3d::new(2.5, 2.0, 10.0)),
    ]
}

/// Dense samples along every scene line with a small deterministic jitter
fn scene_points() -> Vec<Point3d> {
    scene_lines()
        .iter()
        .flat_map(|line| {
            (0..40).map(move |i| {
                let jitter = 0.01 * ((i % 3) as f64 - 1.0);
                line.point_at(i as f64 / 39.0) + Vector3d::new(0.0, 0.0, jitter)
            })
        })
        .collect()
}

/// The scene lines, extended a little past both ends, as seen from `pose`
fn detections(image_id: i32, pose: &CameraPose) -> DetectionRecord {
    let lines: Vec<Segment2> = scene_lines()
        .iter()
        .map(|line| {
            let ends = [line.point_at(-0.1), line.point_at(1.1)];
            let projected = project_points(&camera(), pose, &ends);
            Segment2::new(projected.image_points[0], projected.image_points[1])
        })
        .collect();
    let scores = vec![0.99; lines.len()];
    DetectionRecord::from_raw(image_id, 640, 480, lines, scores)
}

fn poses() -> [CameraPose; 2] {
    [
        CameraPose::identity(),
        CameraPose::new(Vector3d::new(0.0, 0.02, 0.0), Vector3d::new(0.3, 0.1, 0.0)),
    ]
}

fn build_views(rng: &mut StdRng) -> Vec<ImageWireframe> {
    let points = scene_points();
    let config = WireframeConfig::default();
    poses()
        .iter()
        .enumerate()
        .map(|(i, pose)| {
            ImageWireframe::build(&detections(i as i32, pose), &camera(), pose, &points, &config, rng).unwrap()
        })
        .collect()
}

#[test]
fn test_each_view_fits_both_lines() {
    let mut rng = StdRng::seed_from_u64(17);
    for view in build_views(&mut rng) {
        assert_eq!(view.lines().len(), 2);
        assert_eq!(view.fitted_count(), 2);
        for obs in view.observations() {
            assert_eq!(obs.cloud.len(), 40);
        }
    }
}

#[test]
fn test_views_merge_into_one_observation_per_line() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut views = build_views(&mut rng).into_iter();
    let mut merged = views.next().unwrap();
    for view in views {
        merged.combine(view, &mut rng);
    }

    let observations = merged.observations();
    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].labels, vec![EdgeLabel::new(0, 0), EdgeLabel::new(1, 0)]);
    assert_eq!(observations[1].labels, vec![EdgeLabel::new(0, 1), EdgeLabel::new(1, 1)]);

    let lengths: Vec<f64> = observations
        .iter()
        .map(|o| o.segment().unwrap().length())
        .collect();
    assert!((lengths[0] - 4.0).abs() < 0.1);
    assert!((lengths[1] - 2.0).abs() < 0.1);
    assert!(observations.iter().all(|o| !o.stale));
}

#[test]
fn test_clustering_merged_wireframe() {
    let mut rng = StdRng::seed_from_u64(23);
    let views = build_views(&mut rng);

    // Per-view wireframes concatenated without the cross-view merge
    let combined = views
        .iter()
        .map(ImageWireframe::wireframe)
        .fold(wirecrate_core::LineSet::new(), |acc, set| acc.combine(set));
    assert_eq!(combined.edge_count(), 4);

    let config = ClusterConfig {
        min_group: 1,
        ..Default::default()
    };
    let clusters = cluster_line_set(&combined, &config, &mut rng);
    assert_eq!(clusters.len(), 2);
    for cluster in &clusters {
        assert_eq!(cluster.members.edge_count(), 2);
        assert_eq!(cluster.combined.edge_count(), 1);
    }
    let first = clusters[0].combined.edges()[0];
    assert!((first.length() - 4.0).abs() < 0.1);
}

#[test]
fn test_detection_graph_components() {
    let record = detections(0, &CameraPose::identity());
    let graph = WireframeGraph::from_record(&record, &GraphConfig::default());
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.connected_components().len(), 2);
    assert!(graph.intersections(0, 1.0).is_empty());
}
