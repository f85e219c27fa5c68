//! Line set container: free vertices plus labelled edges

use crate::error::{Error, Result};
use crate::point::*;
use crate::segment::Segment;
use crate::traits::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of an edge: the image it was detected in and its line index there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeLabel {
    pub image_id: i32,
    pub line_index: i32,
}

impl EdgeLabel {
    /// Label carried by synthetic edges produced by fitting
    pub const SENTINEL: EdgeLabel = EdgeLabel {
        image_id: -1,
        line_index: -1,
    };

    pub fn new(image_id: i32, line_index: i32) -> Self {
        Self { image_id, line_index }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self::SENTINEL
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.image_id, self.line_index)
    }
}

/// An ordered collection of free vertices and of edges with one label per edge.
///
/// Fields are private so `edges.len() == labels.len()` always holds. Mutating
/// operations consume the set and return the new one, so a set that is shared
/// between merges is never updated behind another owner's back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSet {
    vertices: Vec<Point3d>,
    edges: Vec<Segment>,
    labels: Vec<EdgeLabel>,
}

impl LineSet {
    /// Create an empty line set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a line set from explicit sequences; fails if the label count does not match the edge count
    pub fn from_parts(vertices: Vec<Point3d>, edges: Vec<Segment>, labels: Vec<EdgeLabel>) -> Result<Self> {
        if edges.len() != labels.len() {
            return Err(Error::InvalidData(format!(
                "{} edges but {} labels",
                edges.len(),
                labels.len()
            )));
        }
        Ok(Self { vertices, edges, labels })
    }

    /// Create a line set of synthetic edges, every edge labelled with the sentinel
    pub fn from_edges(edges: Vec<Segment>) -> Self {
        let labels = vec![EdgeLabel::SENTINEL; edges.len()];
        Self {
            vertices: Vec::new(),
            edges,
            labels,
        }
    }

    /// Create a line set holding only free vertices
    pub fn from_vertices(vertices: Vec<Point3d>) -> Self {
        Self {
            vertices,
            ..Self::default()
        }
    }

    pub fn vertices(&self) -> &[Point3d] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Segment] {
        &self.edges
    }

    pub fn labels(&self) -> &[EdgeLabel] {
        &self.labels
    }

    /// Iterate edges together with their labels
    pub fn labelled_edges(&self) -> impl Iterator<Item = (&Segment, &EdgeLabel)> + '_ {
        self.edges.iter().zip(self.labels.iter())
    }

    pub fn push_vertex(&mut self, vertex: Point3d) {
        self.vertices.push(vertex);
    }

    pub fn push_edge(&mut self, edge: Segment, label: EdgeLabel) {
        self.edges.push(edge);
        self.labels.push(label);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of vertices once serialized: the free vertices plus two endpoints per edge
    pub fn serialized_vertex_count(&self) -> usize {
        self.vertices.len() + 2 * self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    /// Concatenate the vertices, edges and labels of `other` after those of `self`
    pub fn combine(mut self, other: LineSet) -> Self {
        self.vertices.extend(other.vertices);
        self.edges.extend(other.edges);
        self.labels.extend(other.labels);
        self
    }

    /// Keep only the edges (and their labels) for which `keep` returns true
    pub fn retain_edges<F>(self, mut keep: F) -> Self
    where
        F: FnMut(&Segment, &EdgeLabel) -> bool,
    {
        let (edges, labels) = self
            .edges
            .into_iter()
            .zip(self.labels)
            .filter(|(e, l)| keep(e, l))
            .unzip();
        Self {
            vertices: self.vertices,
            edges,
            labels,
        }
    }

    /// Keep only the free vertices for which `keep` returns true
    pub fn retain_vertices<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&Point3d) -> bool,
    {
        self.vertices.retain(|v| keep(v));
        self
    }

    /// Drop every vertex outside the box spanned by the two corners, and every
    /// edge with at least one endpoint outside it.
    pub fn enforce_bounding_box(self, corner1: &Point3d, corner2: &Point3d) -> Self {
        let bounds = BoundingBox::from_corners(corner1, corner2);
        self.retain_vertices(|v| bounds.contains(v))
            .retain_edges(|e, _| bounds.contains(&e.start) && bounds.contains(&e.end))
    }

    pub fn into_parts(self) -> (Vec<Point3d>, Vec<Segment>, Vec<EdgeLabel>) {
        (self.vertices, self.edges, self.labels)
    }
}

impl Extend<(Segment, EdgeLabel)> for LineSet {
    fn extend<I: IntoIterator<Item = (Segment, EdgeLabel)>>(&mut self, iter: I) {
        for (edge, label) in iter {
            self.push_edge(edge, label);
        }
    }
}

impl FromIterator<(Segment, EdgeLabel)> for LineSet {
    fn from_iter<I: IntoIterator<Item = (Segment, EdgeLabel)>>(iter: I) -> Self {
        let mut set = LineSet::new();
        set.extend(iter);
        set
    }
}
