//! Graph model: vertices carrying opaque payloads, weighted edges, and
//! the per-solve multiplicity table.
//!
//! Topology lives in a [`petgraph`] arena addressed by dense indices and
//! never changes after [`RouteGraph::build`]. Everything an algorithm
//! mutates (multiplicities, Dijkstra scratch, tour cursors) lives in
//! separate tables keyed by vertex or edge index, so one graph can be
//! solved any number of times, from any number of threads.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;

use crate::types::{Result, RouteError};

/// An undirected, weighted multigraph whose vertices carry payloads of
/// type `P`.
///
/// Vertex ids are `0..vertex_count()` in payload order; edge ids are
/// `0..edge_count()` in input order.
#[derive(Debug, Clone)]
pub struct RouteGraph<P> {
    graph: UnGraph<P, f64>,
    /// Incident edge ids per vertex, in edge insertion order.
    ///
    /// A self-loop is listed twice on its vertex so that the adjacency
    /// length is the vertex degree.
    adjacency: Vec<Vec<usize>>,
}

impl<P> RouteGraph<P> {
    /// Build a graph from vertex payloads, index pairs and a distance
    /// function.
    ///
    /// Edge weights are `distance(&payloads[a], &payloads[b])`. All edge
    /// indices are validated before any weight is computed.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidIndex`] if an edge references a
    /// vertex outside the payload range, or [`RouteError::InvalidWeight`]
    /// if `distance` returns a negative or non-finite value.
    pub fn build<I, F>(payloads: I, edges: &[(usize, usize)], distance: F) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        F: Fn(&P, &P) -> f64,
    {
        let mut graph = UnGraph::<P, f64>::with_capacity(0, edges.len());
        for payload in payloads {
            graph.add_node(payload);
        }
        let vertex_count = graph.node_count();

        for (edge, &(a, b)) in edges.iter().enumerate() {
            if let Some(index) = [a, b].into_iter().find(|&i| i >= vertex_count) {
                return Err(RouteError::InvalidIndex {
                    edge,
                    index,
                    vertex_count,
                });
            }
        }

        let mut adjacency = vec![Vec::new(); vertex_count];
        for (edge, &(a, b)) in edges.iter().enumerate() {
            let (na, nb) = (NodeIndex::new(a), NodeIndex::new(b));
            let weight = distance(&graph[na], &graph[nb]);
            if !weight.is_finite() || weight < 0.0 {
                return Err(RouteError::InvalidWeight { edge, weight });
            }
            graph.add_edge(na, nb, weight);
            adjacency[a].push(edge);
            adjacency[b].push(edge);
        }

        Ok(Self { graph, adjacency })
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate over all vertex ids.
    pub fn vertices(&self) -> std::ops::Range<usize> {
        0..self.vertex_count()
    }

    /// The payload of vertex `v`, or `None` if it does not exist.
    #[must_use]
    pub fn payload(&self, v: usize) -> Option<&P> {
        self.graph.node_weight(NodeIndex::new(v))
    }

    /// Incident edge ids of vertex `v`, in insertion order.
    ///
    /// Self-loops appear twice. Unknown vertices have no adjacency.
    #[must_use]
    pub fn adjacency(&self, v: usize) -> &[usize] {
        self.adjacency.get(v).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of edge ends at vertex `v` (a self-loop counts twice).
    #[must_use]
    pub fn degree(&self, v: usize) -> usize {
        self.adjacency(v).len()
    }

    /// Vertices with odd degree, in ascending id order.
    ///
    /// By the handshake lemma there is always an even number of them.
    #[must_use]
    pub fn odd_vertices(&self) -> Vec<usize> {
        self.vertices().filter(|&v| self.degree(v) % 2 == 1).collect()
    }

    /// The two endpoints of edge `e`.
    ///
    /// # Panics
    ///
    /// Panics if `e` is not a valid edge id.
    #[must_use]
    pub fn endpoints(&self, e: usize) -> (usize, usize) {
        let edge = &self.graph.raw_edges()[e];
        (edge.source().index(), edge.target().index())
    }

    /// The endpoint of edge `e` opposite to `v`.
    ///
    /// For a self-loop this is `v` itself.
    ///
    /// # Panics
    ///
    /// Panics if `e` is not a valid edge id.
    #[must_use]
    pub fn opposite(&self, e: usize, v: usize) -> usize {
        let (a, b) = self.endpoints(e);
        if a == v { b } else { a }
    }

    /// Weight of edge `e`.
    ///
    /// # Panics
    ///
    /// Panics if `e` is not a valid edge id.
    #[must_use]
    pub fn weight(&self, e: usize) -> f64 {
        self.graph[EdgeIndex::new(e)]
    }

    /// Sum of all edge weights (every edge traversed once).
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.graph.edge_weights().sum()
    }

    /// Find the edge joining `a` and `b`.
    ///
    /// Scans the shorter of the two adjacency lists. With parallel edges
    /// the lightest one is returned (lowest id on ties), which is the one
    /// a shortest path would use. Returns `None` if the vertices are not
    /// adjacent.
    #[must_use]
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        let (from, to) = if self.degree(a) <= self.degree(b) {
            (a, b)
        } else {
            (b, a)
        };
        self.adjacency(from)
            .iter()
            .copied()
            .filter(|&e| self.opposite(e, from) == to)
            .min_by(|&x, &y| self.weight(x).total_cmp(&self.weight(y)).then(x.cmp(&y)))
    }

    /// Find a vertex that is not connected to vertex 0.
    ///
    /// Returns `None` when every vertex lies in vertex 0's component
    /// (trivially so for an empty graph).
    #[must_use]
    pub fn disconnected_vertex(&self) -> Option<usize> {
        let mut components = UnionFind::<usize>::new(self.vertex_count());
        for edge in self.graph.raw_edges() {
            components.union(edge.source().index(), edge.target().index());
        }
        self.vertices()
            .skip(1)
            .find(|&v| !components.equiv(0, v))
    }
}

/// Remaining traversal count of every edge.
///
/// Starts at 1 per edge. Eulerian augmentation doubles edges on the
/// chosen retrace paths; tour extraction decrements each count as the
/// edge is walked until everything reaches 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiplicity(Vec<u32>);

impl Multiplicity {
    /// A table with every edge at multiplicity 1.
    #[must_use]
    pub fn new(edge_count: usize) -> Self {
        Self(vec![1; edge_count])
    }

    /// A table sized for `graph`, every edge at multiplicity 1.
    #[must_use]
    pub fn for_graph<P>(graph: &RouteGraph<P>) -> Self {
        Self::new(graph.edge_count())
    }

    /// Number of edges tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no edges are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Multiplicity of edge `e` (0 for unknown edges).
    #[must_use]
    pub fn get(&self, e: usize) -> u32 {
        self.0.get(e).copied().unwrap_or(0)
    }

    /// Overwrite the multiplicity of edge `e`. Unknown edges are ignored.
    pub fn set(&mut self, e: usize, multiplicity: u32) {
        if let Some(m) = self.0.get_mut(e) {
            *m = multiplicity;
        }
    }

    /// Consume one traversal of edge `e`.
    ///
    /// Returns `false` (and changes nothing) if the edge is already
    /// exhausted or unknown.
    pub fn decrement(&mut self, e: usize) -> bool {
        match self.0.get_mut(e) {
            Some(m) if *m > 0 => {
                *m -= 1;
                true
            }
            _ => false,
        }
    }

    /// Add edge `e` to the retrace set, or take it back out.
    ///
    /// An edge at 1 is doubled to 2. An edge already at 2 was doubled by
    /// another retrace path covering the same edge; two retraces over one
    /// edge cancel, so it returns to 1.
    pub fn flip_doubling(&mut self, e: usize) {
        if let Some(m) = self.0.get_mut(e) {
            *m = if *m == 2 { 1 } else { 2 };
        }
    }

    /// Restore every edge to multiplicity 1.
    pub fn reset(&mut self) {
        self.0.fill(1);
    }

    /// Returns `true` once every edge has been fully consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.0.iter().all(|&m| m == 0)
    }

    /// Id of the first edge with remaining multiplicity, if any.
    #[must_use]
    pub fn first_remaining(&self) -> Option<usize> {
        self.0.iter().position(|&m| m > 0)
    }

    /// Number of edges currently at multiplicity 2.
    #[must_use]
    pub fn doubled_count(&self) -> usize {
        self.0.iter().filter(|&&m| m == 2).count()
    }

    /// Multiplicity-weighted degree of vertex `v`.
    #[must_use]
    pub fn vertex_degree<P>(&self, graph: &RouteGraph<P>, v: usize) -> u32 {
        graph.adjacency(v).iter().map(|&e| self.get(e)).sum()
    }

    /// Length of a walk that traverses every edge `multiplicity` times.
    #[must_use]
    pub fn total_length<P>(&self, graph: &RouteGraph<P>) -> f64 {
        self.0
            .iter()
            .enumerate()
            .map(|(e, &m)| f64::from(m) * graph.weight(e))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit(_: &usize, _: &usize) -> f64 {
        1.0
    }

    fn path_graph(n: usize) -> RouteGraph<usize> {
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        RouteGraph::build(0..n, &edges, unit).unwrap()
    }

    #[test]
    fn build_counts() {
        let g = path_graph(4);
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.payload(2), Some(&2));
        assert_eq!(g.payload(4), None);
    }

    #[test]
    fn build_rejects_out_of_range_index() {
        let result = RouteGraph::build(0..3usize, &[(0, 1), (0, 5)], unit);
        assert_eq!(
            result.unwrap_err(),
            RouteError::InvalidIndex {
                edge: 1,
                index: 5,
                vertex_count: 3,
            }
        );
    }

    #[test]
    fn build_validates_indices_before_measuring() {
        // The distance function would reject edge 0, but edge 1's bad
        // index must be reported first.
        let result = RouteGraph::build(0..2usize, &[(0, 1), (1, 9)], |_, _| -1.0);
        assert!(matches!(result, Err(RouteError::InvalidIndex { .. })));
    }

    #[test]
    fn build_rejects_negative_weight() {
        let result = RouteGraph::build(0..2usize, &[(0, 1)], |_, _| -0.5);
        assert!(matches!(
            result,
            Err(RouteError::InvalidWeight { edge: 0, .. })
        ));
    }

    #[test]
    fn build_rejects_nan_weight() {
        let result = RouteGraph::build(0..2usize, &[(0, 1)], |_, _| f64::NAN);
        assert!(matches!(result, Err(RouteError::InvalidWeight { .. })));
    }

    #[test]
    fn weights_come_from_payloads() {
        let g = RouteGraph::build([0.0, 2.5, 7.0], &[(0, 1), (1, 2)], |a: &f64, b: &f64| {
            (a - b).abs()
        })
        .unwrap();
        assert!((g.weight(0) - 2.5).abs() < 1e-12);
        assert!((g.weight(1) - 4.5).abs() < 1e-12);
        assert!((g.total_weight() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn degrees_and_odd_vertices() {
        let g = path_graph(4);
        assert_eq!(g.degree(0), 1);
        assert_eq!(g.degree(1), 2);
        assert_eq!(g.odd_vertices(), vec![0, 3]);
    }

    #[test]
    fn self_loop_counts_twice() {
        let g = RouteGraph::build(0..2usize, &[(0, 1), (1, 1)], unit).unwrap();
        assert_eq!(g.degree(1), 3);
        assert_eq!(g.adjacency(1), &[0, 1, 1]);
        assert_eq!(g.opposite(1, 1), 1);
    }

    #[test]
    fn find_edge_between_adjacent_vertices() {
        let g = path_graph(4);
        assert_eq!(g.find_edge(1, 2), Some(1));
        assert_eq!(g.find_edge(2, 1), Some(1));
        assert_eq!(g.find_edge(0, 3), None);
    }

    #[test]
    fn find_edge_prefers_lightest_parallel_edge() {
        let g = RouteGraph::build([0.0, 0.0], &[(0, 1), (1, 0), (0, 1)], {
            let weights = std::cell::Cell::new(0);
            move |_: &f64, _: &f64| {
                let i = weights.get();
                weights.set(i + 1);
                [3.0, 1.0, 1.0][i]
            }
        })
        .unwrap();
        assert_eq!(g.find_edge(0, 1), Some(1));
    }

    #[test]
    fn connectivity() {
        let g = path_graph(4);
        assert_eq!(g.disconnected_vertex(), None);

        let split = RouteGraph::build(0..4usize, &[(0, 1), (2, 3)], unit).unwrap();
        assert_eq!(split.disconnected_vertex(), Some(2));
    }

    #[test]
    fn multiplicity_lifecycle() {
        let g = path_graph(3);
        let mut m = Multiplicity::for_graph(&g);
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(0), 1);

        m.flip_doubling(0);
        assert_eq!(m.get(0), 2);
        assert_eq!(m.doubled_count(), 1);
        assert!((m.total_length(&g) - 3.0).abs() < 1e-12);
        assert_eq!(m.vertex_degree(&g, 1), 3);

        assert!(m.decrement(1));
        assert!(!m.decrement(1));
        assert_eq!(m.first_remaining(), Some(0));

        m.reset();
        assert_eq!(m, Multiplicity::new(2));
    }

    #[test]
    fn flip_doubling_twice_cancels() {
        let mut m = Multiplicity::new(1);
        m.flip_doubling(0);
        m.flip_doubling(0);
        assert_eq!(m.get(0), 1);
    }

    #[test]
    fn multiplicity_ignores_unknown_edges() {
        let mut m = Multiplicity::new(1);
        m.set(5, 2);
        m.flip_doubling(5);
        assert_eq!(m.get(5), 0);
        assert!(!m.decrement(5));
    }
}
