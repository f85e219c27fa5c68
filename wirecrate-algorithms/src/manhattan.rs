//! Manhattan-world basis estimation and axis alignment of line sets

use crate::ransac::{Estimator, Ransac, RansacParams};
use nalgebra::Matrix3;
use rand::Rng;
use wirecrate_core::{Drawable, EdgeLabel, LineSet, Point3d, Segment, Vector3d, EPSILON};

/// Three mutually orthogonal unit axes, stored as the rows of a rotation-like matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    rows: Matrix3<f64>,
}

impl Basis {
    pub fn from_rows(rows: Matrix3<f64>) -> Self {
        Self { rows }
    }

    pub fn identity() -> Self {
        Self::from_rows(Matrix3::identity())
    }

    /// Matrix whose rows are the three axes
    pub fn rows(&self) -> &Matrix3<f64> {
        &self.rows
    }

    pub fn axis(&self, i: usize) -> Vector3d {
        self.rows.row(i).transpose()
    }

    /// Absolute cosine between `direction` and each axis
    pub fn alignments(&self, direction: &Vector3d) -> Vector3d {
        let norm = direction.norm();
        if norm < EPSILON {
            return Vector3d::zeros();
        }
        (self.rows * (direction / norm)).abs()
    }

    /// Sum of the two smaller alignments; zero for a direction lying on an axis
    pub fn alignment_error(&self, direction: &Vector3d) -> f64 {
        let a = self.alignments(direction);
        a.sum() - a.max()
    }

    /// Index of the best-aligned axis and that axis oriented along `direction`
    pub fn dominant_axis(&self, direction: &Vector3d) -> (usize, Vector3d) {
        let (index, _) = self.alignments(direction).argmax();
        let axis = self.axis(index);
        if axis.dot(direction) < 0.0 {
            (index, -axis)
        } else {
            (index, axis)
        }
    }
}

/// RANSAC estimator of a Manhattan basis from unit line directions
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanEstimator;

impl Estimator for ManhattanEstimator {
    type Datum = Vector3d;
    type Model = Basis;
    const SAMPLE_SIZE: usize = 3;

    /// The basis is the set of right singular vectors of the stacked samples,
    /// i.e. the eigenvectors of their Gram matrix.
    fn fit(&self, samples: &[Vector3d]) -> Option<Basis> {
        let gram = samples.iter().fold(Matrix3::zeros(), |acc, d| acc + d * d.transpose());
        let svd = gram.svd(true, false);
        let u = svd.u?;
        Some(Basis::from_rows(u.transpose()))
    }

    fn error(&self, datum: &Vector3d, model: &Basis) -> f64 {
        model.alignment_error(datum)
    }
}

/// Parameters of the basis search: candidates are never refit on their inliers
pub fn manhattan_params(iterations: usize, threshold: f64) -> RansacParams {
    RansacParams::new(iterations, threshold).without_refit()
}

/// Unit directions of every non-degenerate edge
pub fn edge_directions(set: &LineSet) -> Vec<Vector3d> {
    set.edges().iter().filter_map(Segment::direction).collect()
}

/// Fit a basis to the edge directions of `set`; `None` with fewer than three usable edges
pub fn fit_basis<R: Rng + ?Sized>(set: &LineSet, iterations: usize, threshold: f64, rng: &mut R) -> Option<(Basis, usize)> {
    let directions = edge_directions(set);
    let result = Ransac::new(ManhattanEstimator, manhattan_params(iterations, threshold)).run(&directions, rng);
    let inliers = result.inlier_count();
    result.model.map(|basis| (basis, inliers))
}

/// Fit a basis and append its three axes as sentinel-labelled edges.
///
/// The axes start at the center of the set and are as long as its longest edge.
pub fn add_basis_directions<R: Rng + ?Sized>(
    set: LineSet,
    iterations: usize,
    threshold: f64,
    rng: &mut R,
) -> Option<(LineSet, Basis)> {
    let (basis, inliers) = fit_basis(&set, iterations, threshold, rng)?;
    log::debug!("Manhattan basis supported by {} of {} edges", inliers, set.edge_count());

    let origin = set.center().unwrap_or_else(Point3d::origin);
    let length = set
        .edges()
        .iter()
        .map(Segment::length)
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let mut set = set;
    for i in 0..3 {
        set.push_edge(Segment::new(origin, origin + basis.axis(i) * length), EdgeLabel::SENTINEL);
    }
    Some((set, basis))
}

/// Keep only the edges whose alignment error against `basis` is below `threshold`
pub fn filter_basis_directions(set: LineSet, basis: &Basis, threshold: f64) -> LineSet {
    set.retain_edges(|edge, _| {
        edge.direction()
            .map_or(false, |d| basis.alignment_error(&d) < threshold)
    })
}

/// Re-express an edge along its dominant axis, keeping its midpoint and its
/// extent along that axis.
pub fn snap_to_basis(edge: &Segment, basis: &Basis) -> Segment {
    let v = edge.vector();
    let (_, axis) = basis.dominant_axis(&v);
    let half = 0.5 * axis.dot(&v).abs();
    let mid = edge.midpoint();
    Segment::new(mid - axis * half, mid + axis * half)
}

/// Filter to the basis-aligned edges and snap each onto its axis, keeping labels
pub fn manhattan_line_set(set: LineSet, basis: &Basis, threshold: f64) -> LineSet {
    let (vertices, edges, labels) = filter_basis_directions(set, basis, threshold).into_parts();
    let mut out = LineSet::from_vertices(vertices);
    out.extend(edges.iter().map(|e| snap_to_basis(e, basis)).zip(labels));
    out
}
