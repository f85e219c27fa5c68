//! Graph of detected 2D lines and intersection analysis
//!
//! Line endpoints are snapped to integer grid cells; each distinct cell is a
//! vertex and each detected line an edge between its two endpoint cells.

use crate::config::GraphConfig;
use std::collections::HashMap;
use wirecrate_core::{DetectionRecord, Point2d, Segment2, Vector2d, Vector3d, EPSILON};

/// Disjoint sets over `0..len` with path compression and union by size
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut id: usize) -> usize {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[id] != root {
            let next = self.parent[id];
            self.parent[id] = root;
            id = next;
        }
        root
    }

    fn connect(&mut self, a: usize, b: usize) {
        let a = self.find(a);
        let b = self.find(b);
        if a == b {
            return;
        }
        if self.size[a] > self.size[b] {
            self.parent[b] = a;
            self.size[a] += self.size[b];
        } else {
            self.parent[a] = b;
            self.size[b] += self.size[a];
        }
    }
}

/// One detected line as a graph edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    /// Detection confidence
    pub score: f64,
    /// The line in image coordinates
    pub segment: Segment2,
}

/// A connected subgraph, as vertex and edge indices of the parent graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgraph {
    pub vertices: Vec<usize>,
    pub edges: Vec<usize>,
}

impl Subgraph {
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Edges meeting at approximately one point
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionGroup {
    /// Mean of the member intersection points
    pub point: Point2d,
    pub edges: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct WireframeGraph {
    cells: Vec<(i64, i64)>,
    edges: Vec<GraphEdge>,
}

impl WireframeGraph {
    /// Build a graph from lines and their scores.
    ///
    /// An endpoint `(x, y)` falls into cell `(floor(x * scale.x), floor(y * scale.y))`.
    pub fn new(lines: &[Segment2], scores: &[f64], scale: Vector2d) -> Self {
        let mut graph = Self::default();
        let mut index: HashMap<(i64, i64), usize> = HashMap::new();

        let mut vertex = |p: &Point2d, cells: &mut Vec<(i64, i64)>| {
            let cell = ((p.x * scale.x).floor() as i64, (p.y * scale.y).floor() as i64);
            *index.entry(cell).or_insert_with(|| {
                cells.push(cell);
                cells.len() - 1
            })
        };

        for (segment, &score) in lines.iter().zip(scores) {
            let source = vertex(&segment.start, &mut graph.cells);
            let target = vertex(&segment.end, &mut graph.cells);
            graph.edges.push(GraphEdge {
                source,
                target,
                score,
                segment: *segment,
            });
        }
        graph
    }

    /// Graph of the detections scoring above the threshold, on a grid of
    /// `config.scale` cells per image side.
    pub fn from_record(record: &DetectionRecord, config: &GraphConfig) -> Self {
        let (lines, scores) = record.filtered(config.score_threshold);
        let scale = Vector2d::new(
            config.scale / record.width.max(1) as f64,
            config.scale / record.height.max(1) as f64,
        );
        Self::new(&lines, &scores, scale)
    }

    pub fn vertex_count(&self) -> usize {
        self.cells.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Grid cell of every vertex
    pub fn cells(&self) -> &[(i64, i64)] {
        &self.cells
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Maximal connected subgraphs, ordered by their lowest vertex index
    pub fn connected_components(&self) -> Vec<Subgraph> {
        let mut sets = UnionFind::new(self.cells.len());
        for edge in &self.edges {
            sets.connect(edge.source, edge.target);
        }

        let mut slot: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Subgraph> = Vec::new();
        for v in 0..self.cells.len() {
            let root = sets.find(v);
            let i = *slot.entry(root).or_insert_with(|| {
                components.push(Subgraph::default());
                components.len() - 1
            });
            components[i].vertices.push(v);
        }
        for (e, edge) in self.edges.iter().enumerate() {
            let root = sets.find(edge.source);
            if let Some(&i) = slot.get(&root) {
                components[i].edges.push(e);
            }
        }
        components
    }

    /// Components with at least `min_edges` edges
    pub fn components_with_min_edges(&self, min_edges: usize) -> Vec<Subgraph> {
        self.connected_components()
            .into_iter()
            .filter(|c| c.edge_count() >= min_edges)
            .collect()
    }

    /// Edges crossing edge `edge`, grouped by intersection point.
    ///
    /// An intersection joins the first group whose first point is within
    /// `closeness`; otherwise it starts a new group.
    pub fn intersections(&self, edge: usize, closeness: f64) -> Vec<IntersectionGroup> {
        let Some(subject) = self.edges.get(edge) else {
            return Vec::new();
        };

        // (anchor, sum of points, members)
        let mut groups: Vec<(Point2d, Vector2d, Vec<usize>)> = Vec::new();
        for (j, other) in self.edges.iter().enumerate() {
            if j == edge {
                continue;
            }
            let Some(p) = segment_intersection(&subject.segment, &other.segment) else {
                continue;
            };
            match groups.iter_mut().find(|(anchor, _, _)| (anchor - p).norm() <= closeness) {
                Some((_, sum, members)) => {
                    *sum += p.coords;
                    members.push(j);
                }
                None => groups.push((p, p.coords, vec![j])),
            }
        }

        groups
            .into_iter()
            .map(|(_, sum, edges)| IntersectionGroup {
                point: Point2d::from(sum / edges.len() as f64),
                edges,
            })
            .collect()
    }
}

/// Intersection point of two 2D segments, `None` when they are parallel,
/// degenerate, or cross outside either segment.
///
/// Each segment is lifted to the projective line through its endpoints; the
/// cross product of the two lines is their intersection.
pub fn segment_intersection(a: &Segment2, b: &Segment2) -> Option<Point2d> {
    let lift = |p: &Point2d| Vector3d::new(p.x, p.y, 1.0);
    let line_a = lift(&a.start).cross(&lift(&a.end));
    let line_b = lift(&b.start).cross(&lift(&b.end));
    let x = line_a.cross(&line_b);
    if x.z.abs() < EPSILON {
        return None;
    }
    let p = Point2d::new(x.x / x.z, x.y / x.z);

    // p lies within a segment when the vectors to its endpoints point apart
    let within = |s: &Segment2| (s.start - p).dot(&(s.end - p)) <= 1e-9;
    (within(a) && within(b)).then_some(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment2 {
        Segment2::new(Point2d::new(x0, y0), Point2d::new(x1, y1))
    }

    #[test]
    fn test_segment_intersection() {
        let a = seg(0.0, 0.0, 1.0, 1.0);
        let b = seg(0.0, 1.0, 1.0, 0.0);
        let expected = Point2d::new(0.5, 0.5);
        assert_relative_eq!(segment_intersection(&a, &b).unwrap(), expected, epsilon = 1e-12);
        assert_relative_eq!(segment_intersection(&b.reversed(), &a.reversed()).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_no_intersection() {
        let a = seg(0.0, 0.0, 1.0, 0.0);
        // parallel
        assert!(segment_intersection(&a, &seg(0.0, 1.0, 1.0, 1.0)).is_none());
        // lines cross at (2, 0), outside `a`
        assert!(segment_intersection(&a, &seg(2.0, -1.0, 2.0, 1.0)).is_none());
        // degenerate
        assert!(segment_intersection(&a, &seg(0.5, 0.0, 0.5, 0.0)).is_none());
    }

    #[test]
    fn test_touching_endpoints_intersect() {
        let a = seg(0.0, 0.0, 1.0, 0.0);
        let b = seg(1.0, 0.0, 1.0, 1.0);
        assert_relative_eq!(segment_intersection(&a, &b).unwrap(), Point2d::new(1.0, 0.0), epsilon = 1e-12);
    }

    fn square_and_stray() -> WireframeGraph {
        let lines = [
            seg(0.0, 0.0, 10.0, 0.0),
            seg(10.0, 0.0, 10.0, 10.0),
            seg(10.0, 10.0, 0.0, 10.0),
            seg(0.0, 10.0, 0.0, 0.2),
            seg(50.0, 50.0, 60.0, 60.0),
        ];
        WireframeGraph::new(&lines, &[0.99; 5], Vector2d::new(1.0, 1.0))
    }

    #[test]
    fn test_vertices_are_deduplicated_by_cell() {
        let graph = square_and_stray();
        // (0, 0.2) shares the cell of (0, 0)
        assert_eq!(graph.vertex_count(), 6);
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(graph.edges()[3].target, graph.edges()[0].source);
    }

    #[test]
    fn test_connected_components() {
        let graph = square_and_stray();
        let components = graph.connected_components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].edges, vec![0, 1, 2, 3]);
        assert_eq!(components[1].edges, vec![4]);

        let large = graph.components_with_min_edges(2);
        assert_eq!(large.len(), 1);
        assert_eq!(large[0].vertices.len(), 4);
    }

    #[test]
    fn test_intersection_groups() {
        let lines = [
            seg(0.0, 5.0, 10.0, 5.0),
            seg(3.0, 0.0, 3.0, 10.0),
            seg(3.2, 0.0, 3.2, 10.0),
            seg(8.0, 0.0, 8.0, 10.0),
            seg(20.0, 0.0, 20.0, 10.0),
        ];
        let graph = WireframeGraph::new(&lines, &[1.0; 5], Vector2d::new(1.0, 1.0));
        let groups = graph.intersections(0, 1.0);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].edges, vec![1, 2]);
        assert_relative_eq!(groups[0].point, Point2d::new(3.1, 5.0), epsilon = 1e-9);
        assert_eq!(groups[1].edges, vec![3]);
        assert!(graph.intersections(99, 1.0).is_empty());
    }

    #[test]
    fn test_from_record_filters_and_scales() {
        let record = DetectionRecord::from_raw(
            1,
            256,
            256,
            vec![seg(0.0, 0.0, 100.0, 0.0), seg(0.0, 0.0, 0.0, 100.0)],
            vec![0.99, 0.5],
        );
        let graph = WireframeGraph::from_record(&record, &GraphConfig::default());
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.cells(), &[(0, 0), (50, 0)]);
    }
}
