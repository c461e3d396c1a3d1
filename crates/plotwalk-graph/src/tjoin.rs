//! Parity repair: pair up the odd-degree vertices and double the
//! shortest paths between partners.
//!
//! 1. **T-join:** run Dijkstra from every odd vertex and record the
//!    shortest path between every pair of odd vertices as an edge of a
//!    [`MatchGraph`] (matching vertex `i` is the `i`-th odd vertex).
//! 2. **Augmentation:** after the matching picks the pairs, every edge on
//!    a chosen path is doubled. The walk retraces those edges, so each
//!    odd vertex gains one extra edge end and becomes even.

use tracing::debug;

use crate::graph::{Multiplicity, RouteGraph};
use crate::matching::MatchGraph;
use crate::shortest_path::shortest_paths;
use crate::types::{Result, RouteError};

/// The shortest path between two odd vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct TJoinPath {
    /// Route-graph vertex ids from one odd vertex to the other, both
    /// inclusive.
    pub vertices: Vec<usize>,
    /// Sum of the edge weights along `vertices`.
    pub length: f64,
}

impl TJoinPath {
    /// First vertex of the path.
    #[must_use]
    pub fn start(&self) -> Option<usize> {
        self.vertices.first().copied()
    }

    /// Last vertex of the path.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        self.vertices.last().copied()
    }
}

// ---------------------------------------------------------------------------
// T-join
// ---------------------------------------------------------------------------

/// Build the complete matching graph over the odd vertices of `graph`.
///
/// Matching vertex `i` stands for `graph.odd_vertices()[i]`. For every
/// pair `i < j` there is one edge weighted by the shortest-path distance,
/// whose payload is the path running from odd vertex `i` to odd vertex
/// `j`. Edges are inserted in `(i, j)` lexicographic order.
///
/// # Errors
///
/// Returns [`RouteError::DisconnectedGraph`] if some pair of odd
/// vertices has no connecting path.
pub fn build_tjoin<P>(graph: &RouteGraph<P>) -> Result<MatchGraph<TJoinPath>> {
    let odd = graph.odd_vertices();
    let mut tjoin = MatchGraph::new(odd.len());

    for (i, &from) in odd.iter().enumerate() {
        let tree = shortest_paths(graph, from);
        for (j, &to) in odd.iter().enumerate().skip(i + 1) {
            let Some(vertices) = tree.path_to(to) else {
                return Err(RouteError::DisconnectedGraph { from, to });
            };
            let length = tree.distance(to);
            tjoin.add_edge(i, j, length, TJoinPath { vertices, length })?;
        }
    }

    debug!(
        odd_vertices = odd.len(),
        candidate_paths = tjoin.edge_count(),
        "built T-join"
    );
    Ok(tjoin)
}

// ---------------------------------------------------------------------------
// Augmentation
// ---------------------------------------------------------------------------

/// Double every edge on the given retrace paths.
///
/// Paths are applied as a symmetric difference: an edge that a second
/// path crosses again is taken back out of the retrace set, which keeps
/// every vertex degree even when heuristic matchings pick overlapping
/// paths. For edge-disjoint paths this is plain doubling.
///
/// # Errors
///
/// Returns [`RouteError::NotAdjacent`] if two consecutive path vertices
/// are not joined by an edge. `multiplicity` may be partially updated in
/// that case.
pub fn augment<'p, P, I>(
    graph: &RouteGraph<P>,
    multiplicity: &mut Multiplicity,
    paths: I,
) -> Result<()>
where
    I: IntoIterator<Item = &'p TJoinPath>,
{
    for path in paths {
        for pair in path.vertices.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let edge = graph
                .find_edge(from, to)
                .ok_or(RouteError::NotAdjacent { from, to })?;
            multiplicity.flip_doubling(edge);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit_graph(n: usize, edges: &[(usize, usize)]) -> RouteGraph<usize> {
        RouteGraph::build(0..n, edges, |_, _| 1.0).unwrap()
    }

    #[test]
    fn path_graph_has_one_candidate() {
        let g = unit_graph(4, &[(0, 1), (1, 2), (2, 3)]);
        let tjoin = build_tjoin(&g).unwrap();
        assert_eq!(tjoin.size(), 2);
        assert_eq!(tjoin.edge_count(), 1);
        let path = tjoin.payload(0).unwrap();
        assert_eq!(path.vertices, vec![0, 1, 2, 3]);
        assert_eq!(path.start(), Some(0));
        assert_eq!(path.end(), Some(3));
        assert!((path.length - 3.0).abs() < 1e-12);
        assert!((tjoin.weight(0).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn eulerian_graph_has_empty_tjoin() {
        let g = unit_graph(3, &[(0, 1), (1, 2), (2, 0)]);
        let tjoin = build_tjoin(&g).unwrap();
        assert_eq!(tjoin.size(), 0);
        assert_eq!(tjoin.edge_count(), 0);
    }

    #[test]
    fn star_has_complete_tjoin() {
        // Centre 0 with leaves 1..=4: degree 4 at the centre, 1 at leaves.
        let g = unit_graph(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
        let tjoin = build_tjoin(&g).unwrap();
        assert_eq!(tjoin.size(), 4);
        assert_eq!(tjoin.edge_count(), 6);
        for e in 0..6 {
            let path = tjoin.payload(e).unwrap();
            assert_eq!(path.vertices.len(), 3);
            assert_eq!(path.vertices[1], 0);
        }
        // Edge 0 pairs odd vertices 0 and 1, i.e. leaves 1 and 2.
        assert_eq!(tjoin.payload(0).unwrap().vertices, vec![1, 0, 2]);
    }

    #[test]
    fn disconnected_odd_vertices_fail() {
        let g = unit_graph(4, &[(0, 1), (2, 3)]);
        assert_eq!(
            build_tjoin(&g).unwrap_err(),
            RouteError::DisconnectedGraph { from: 0, to: 2 }
        );
    }

    #[test]
    fn augment_doubles_path_edges() {
        let g = unit_graph(4, &[(0, 1), (1, 2), (2, 3)]);
        let mut m = Multiplicity::for_graph(&g);
        let path = TJoinPath {
            vertices: vec![0, 1, 2, 3],
            length: 3.0,
        };
        augment(&g, &mut m, [&path]).unwrap();
        assert_eq!(m.doubled_count(), 3);
        for v in g.vertices() {
            assert_eq!(m.vertex_degree(&g, v) % 2, 0);
        }
    }

    #[test]
    fn overlapping_paths_cancel() {
        // Two leaves on each side of a doubled bridge 2=3. Pairing the
        // leaves crosswise sends both retraces over the bridge.
        let g = unit_graph(6, &[(0, 2), (1, 2), (2, 3), (2, 3), (3, 4), (3, 5)]);
        assert_eq!(g.odd_vertices(), vec![0, 1, 4, 5]);
        let mut m = Multiplicity::for_graph(&g);
        let first = TJoinPath {
            vertices: vec![0, 2, 3, 4],
            length: 3.0,
        };
        let second = TJoinPath {
            vertices: vec![1, 2, 3, 5],
            length: 3.0,
        };
        augment(&g, &mut m, [&first, &second]).unwrap();
        assert_eq!(m.get(2), 1);
        assert_eq!(m.get(3), 1);
        assert_eq!(m.doubled_count(), 4);
        for v in g.vertices() {
            assert_eq!(m.vertex_degree(&g, v) % 2, 0);
        }
    }

    #[test]
    fn augment_rejects_non_adjacent_steps() {
        let g = unit_graph(3, &[(0, 1), (1, 2)]);
        let mut m = Multiplicity::for_graph(&g);
        let path = TJoinPath {
            vertices: vec![0, 2],
            length: 2.0,
        };
        assert_eq!(
            augment(&g, &mut m, [&path]).unwrap_err(),
            RouteError::NotAdjacent { from: 0, to: 2 }
        );
    }
}
