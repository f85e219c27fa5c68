//! Grouping of nearby edges and consensus fitting of each group

use crate::config::{ClusterConfig, ConsensusMethod};
use crate::line_fit::Line3dEstimator;
use crate::ransac::{Ransac, RansacParams};
use nalgebra::Matrix3;
use rand::Rng;
use std::collections::VecDeque;
use wirecrate_core::{EdgeLabel, LineSet, Point3d, Segment, Vector3d, EPSILON};

/// Greedy pivot grouping.
///
/// The first remaining edge becomes the pivot and takes every remaining edge
/// related to it; the group is kept when it has more than `min_group` members.
/// Kept groups are disjoint.
fn group_edges<F>(set: &LineSet, min_group: usize, related: F) -> Vec<LineSet>
where
    F: Fn(&Segment, &Segment) -> bool,
{
    let mut remaining: VecDeque<(Segment, EdgeLabel)> =
        set.labelled_edges().map(|(e, l)| (*e, *l)).collect();
    let mut groups = Vec::new();

    while let Some((pivot, label)) = remaining.pop_front() {
        let (members, rest): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|(edge, _)| related(&pivot, edge));
        remaining = rest.into();

        if members.len() + 1 > min_group {
            let group: LineSet = std::iter::once((pivot, label)).chain(members).collect();
            groups.push(group);
        }
    }

    groups
}

/// Groups of edges lying close to each other's lines
pub fn nearby_groups(set: &LineSet, config: &ClusterConfig) -> Vec<LineSet> {
    let groups = group_edges(set, config.min_group, |pivot, edge| {
        pivot.is_close_to(edge, config.tolerance, config.samples)
            && (!config.symmetric || edge.is_close_to(pivot, config.tolerance, config.samples))
    });
    log::debug!("{} edges form {} nearby groups", set.edge_count(), groups.len());
    groups
}

/// Groups of mutually parallel edges, by the cross-product test
pub fn parallel_groups(set: &LineSet, tolerance: f64, min_group: usize) -> Vec<LineSet> {
    group_edges(set, min_group, |pivot, edge| pivot.is_parallel(edge, tolerance))
}

/// Average of the edge directions, each flipped to agree with the running sum
pub fn consensus_direction(edges: &[Segment]) -> Option<Vector3d> {
    let mut directions = edges.iter().filter_map(Segment::direction);
    let mut sum = directions.next()?;
    for d in directions {
        if d.dot(&sum) < 0.0 {
            sum -= d;
        } else {
            sum += d;
        }
    }
    let norm = sum.norm();
    (norm > EPSILON).then(|| sum / norm)
}

/// Least-squares point closest to the lines through every edge.
///
/// Solves `sum(I - d d^T) x = sum(I - d d^T) p` by SVD; when the lines are
/// parallel the minimum-norm solution is returned.
pub fn closest_intersection_point(edges: &[Segment]) -> Option<Point3d> {
    let mut a = Matrix3::zeros();
    let mut b = Vector3d::zeros();
    let mut count = 0;
    for edge in edges {
        if let Some(d) = edge.direction() {
            let projector = Matrix3::identity() - d * d.transpose();
            a += projector;
            b += projector * edge.start.coords;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let x = a.svd(true, true).solve(&b, 1e-10).ok()?;
    Some(Point3d::from(x))
}

/// Reduce a group to one edge along the consensus direction through the
/// closest intersection point, spanning the projections of every endpoint.
pub fn combine_edges(set: &LineSet) -> Option<LineSet> {
    let edges = set.edges();
    let direction = consensus_direction(edges)?;
    let origin = closest_intersection_point(edges)?;

    let (min_t, max_t) = edges
        .iter()
        .flat_map(Segment::endpoints)
        .map(|p| direction.dot(&(p - origin)))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| (lo.min(t), hi.max(t)));

    Some(LineSet::from_edges(vec![Segment::new(
        origin + direction * min_t,
        origin + direction * max_t,
    )]))
}

/// Reduce a group to one edge by line RANSAC over all its vertices and endpoints
pub fn combine_edges_with_ransac<R: Rng + ?Sized>(
    set: &LineSet,
    iterations: usize,
    threshold: f64,
    rng: &mut R,
) -> Option<LineSet> {
    let points: Vec<Point3d> = set
        .vertices()
        .iter()
        .copied()
        .chain(set.edges().iter().flat_map(Segment::endpoints))
        .collect();
    let ransac = Ransac::new(Line3dEstimator, RansacParams::new(iterations, threshold));
    let segment = ransac.run(&points, rng).model?;
    Some(LineSet::from_edges(vec![segment]))
}

/// Consensus edge for one group with the configured method
pub fn combine_group<R: Rng + ?Sized>(set: &LineSet, method: &ConsensusMethod, rng: &mut R) -> Option<LineSet> {
    match *method {
        ConsensusMethod::Average => combine_edges(set),
        ConsensusMethod::Ransac { iterations, threshold } => combine_edges_with_ransac(set, iterations, threshold, rng),
    }
}

/// A group of nearby edges and its consensus edge
#[derive(Debug, Clone)]
pub struct Cluster {
    pub members: LineSet,
    pub combined: LineSet,
}

/// Group `set` and fit every group; groups without a consensus edge are skipped.
pub fn cluster_line_set<R: Rng + ?Sized>(set: &LineSet, config: &ClusterConfig, rng: &mut R) -> Vec<Cluster> {
    nearby_groups(set, config)
        .into_iter()
        .filter_map(|members| {
            let combined = combine_group(&members, &config.consensus, rng)?;
            Some(Cluster { members, combined })
        })
        .collect()
}
