//! Cross-view merging of line observations
//!
//! Observations of the same physical line seen from different images are
//! merged when their fitted segments overlap and are close; the merged point
//! clouds are refit. Passes repeat until no pair merges.

use crate::config::{LineFitConfig, MergeConfig};
use crate::line_fit::fit_line;
use rand::Rng;
use std::collections::VecDeque;
use wirecrate_core::{FittedLine, LineObservation, Segment};

/// `a` projected onto the direction of `b` is not entirely before `b.start`
/// nor entirely past `b.end`.
fn overlaps_onto(a: &Segment, b: &Segment) -> bool {
    let Some(direction) = b.direction() else {
        return false;
    };
    let length = b.length();
    let s = direction.dot(&(a.start - b.start));
    let e = direction.dot(&(a.end - b.start));
    let before = s < 0.0 && e < 0.0;
    let after = s > length && e > length;
    !(before || after)
}

/// Whether two segments share part of their extent, checked from both sides
pub fn lines_overlap(a: &Segment, b: &Segment) -> bool {
    overlaps_onto(a, b) && overlaps_onto(b, a)
}

/// Directions agree up to sign within the direction tolerance and each
/// endpoint lies within the position tolerance of the other segment's line.
pub fn lines_close(a: &Segment, b: &Segment, config: &MergeConfig) -> bool {
    if !a.is_aligned(b, config.direction_tolerance) {
        return false;
    }
    let tol = config.position_tolerance;
    a.endpoints().iter().all(|p| b.distance_to_line(p) < tol)
        && b.endpoints().iter().all(|p| a.distance_to_line(p) < tol)
}

/// Whether two observations should be merged
pub fn observations_match(a: &LineObservation, b: &LineObservation, config: &MergeConfig) -> bool {
    match (a.segment(), b.segment()) {
        (Some(sa), Some(sb)) => lines_overlap(sa, sb) && lines_close(sa, sb, config),
        _ => false,
    }
}

/// Merge `partners` into `base` and refit the combined cloud.
///
/// When the refit fails, the previous segment of `base` is kept with its errors
/// recomputed against the merged cloud, and the result is marked stale.
fn merge_into<R: Rng + ?Sized>(
    base: LineObservation,
    partners: Vec<LineObservation>,
    fit: &LineFitConfig,
    rng: &mut R,
) -> LineObservation {
    let previous = base.segment().copied();
    let mut cloud = base.cloud;
    let mut labels = base.labels;
    let mut stale = base.stale;
    for partner in partners {
        cloud = cloud.concat(partner.cloud);
        labels.extend(partner.labels);
        stale |= partner.stale;
    }

    let line = match fit_line(cloud.as_slice(), fit, rng) {
        Some(line) => Some(line),
        None => previous.map(|segment| {
            log::warn!(
                "refit of {} merged points failed, keeping previous line geometry",
                cloud.len()
            );
            stale = true;
            let inliers = cloud
                .iter()
                .filter(|p| segment.distance_to_line(p) < fit.inlier_threshold)
                .count();
            FittedLine::from_segment(segment, inliers, cloud.as_slice())
        }),
    };

    LineObservation {
        cloud,
        line,
        labels,
        stale,
    }
}

/// One simplification pass.
///
/// Observations without a line are dropped. Each remaining observation, in
/// order, absorbs every later observation matching it. Returns the new list
/// and whether anything merged.
pub fn simplify_pass<R: Rng + ?Sized>(
    observations: Vec<LineObservation>,
    merge: &MergeConfig,
    fit: &LineFitConfig,
    rng: &mut R,
) -> (Vec<LineObservation>, bool) {
    let mut pending: VecDeque<LineObservation> = observations.into();
    let mut out = Vec::with_capacity(pending.len());
    let mut merged = false;

    while let Some(current) = pending.pop_front() {
        if !current.has_line() {
            continue;
        }
        let (partners, rest): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|other| observations_match(&current, other, merge));
        pending = rest.into();

        if partners.is_empty() {
            out.push(current);
        } else {
            merged = true;
            out.push(merge_into(current, partners, fit, rng));
        }
    }

    (out, merged)
}

/// Repeat [`simplify_pass`] until a pass merges nothing.
///
/// Every merging pass removes at least one observation, so this terminates.
/// Returns the stable observations and the number of passes run.
pub fn merge_until_stable<R: Rng + ?Sized>(
    observations: Vec<LineObservation>,
    merge: &MergeConfig,
    fit: &LineFitConfig,
    rng: &mut R,
) -> (Vec<LineObservation>, usize) {
    let mut current = observations;
    let mut passes = 0;
    loop {
        let before = current.len();
        let (next, merged) = simplify_pass(current, merge, fit, rng);
        passes += 1;
        log::debug!("merge pass {}: {} -> {} observations", passes, before, next.len());
        current = next;
        if !merged {
            return (current, passes);
        }
    }
}
