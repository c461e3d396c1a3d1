//! Euler tour extraction by cycle splicing.
//!
//! Every vertex of an augmented graph has even multiplicity-weighted
//! degree, so a walk that keeps taking unused edges can only get stuck
//! where it started. [`EulerTour::tour`] walks such a cycle, then splices
//! further cycles in at every vertex that still has unused edges.

use crate::graph::{Multiplicity, RouteGraph};

/// Tour extraction state for one solve.
///
/// Consumes a [`Multiplicity`] table: every traversal decrements the
/// walked edge, so once a full tour has been taken every count is 0.
#[derive(Debug)]
pub struct EulerTour<'g, P> {
    graph: &'g RouteGraph<P>,
    remaining: Multiplicity,
    /// Per vertex, the position in its adjacency list before which every
    /// edge is exhausted.
    cursor: Vec<usize>,
}

impl<'g, P> EulerTour<'g, P> {
    /// Prepare to walk `graph` using the traversal counts in `remaining`.
    #[must_use]
    pub fn new(graph: &'g RouteGraph<P>, remaining: Multiplicity) -> Self {
        Self {
            graph,
            remaining,
            cursor: vec![0; graph.vertex_count()],
        }
    }

    /// Take the first unused edge at `v` and return its id.
    fn take_edge(&mut self, v: usize) -> Option<usize> {
        let graph = self.graph;
        let adjacency = graph.adjacency(v);
        let cursor = self.cursor.get_mut(v)?;
        while let Some(&edge) = adjacency.get(*cursor) {
            if self.remaining.decrement(edge) {
                return Some(edge);
            }
            *cursor += 1;
        }
        None
    }

    /// Walk unused edges from `start` until no unused edge remains at the
    /// current vertex.
    ///
    /// Returns the visited vertices, beginning with `start`. In a graph
    /// where every degree is even the walk ends back at `start`; a walk of
    /// length one means `start` had nothing left.
    pub fn cycle_walk(&mut self, start: usize) -> Vec<usize> {
        let mut walk = vec![start];
        let mut current = start;
        while let Some(edge) = self.take_edge(current) {
            current = self.graph.opposite(edge, current);
            walk.push(current);
        }
        walk
    }

    /// Build a closed walk from `root` that uses up every edge reachable
    /// from it.
    ///
    /// Equivalent to the recursive definition `tour(v) = [v]` if the
    /// cycle from `v` is trivial, else the concatenation of `tour(c)` for
    /// each `c` of that cycle. The recursion is unrolled onto an explicit
    /// stack of vertices still to be explored, so deep splicing does not
    /// grow the call stack.
    pub fn tour(&mut self, root: usize) -> Vec<usize> {
        let mut route = Vec::new();
        let mut pending = vec![root];
        while let Some(v) = pending.pop() {
            let cycle = self.cycle_walk(v);
            if cycle.len() == 1 {
                route.push(v);
            } else {
                pending.extend(cycle.into_iter().rev());
            }
        }
        route
    }

    /// Traversal counts not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> &Multiplicity {
        &self.remaining
    }

    /// Give back the traversal table.
    #[must_use]
    pub fn into_remaining(self) -> Multiplicity {
        self.remaining
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit_graph(n: usize, edges: &[(usize, usize)]) -> RouteGraph<usize> {
        RouteGraph::build(0..n, edges, |_, _| 1.0).unwrap()
    }

    /// Every consecutive pair must be an edge, and each edge must be used
    /// exactly as often as its multiplicity said.
    fn assert_covers(graph: &RouteGraph<usize>, multiplicity: &Multiplicity, route: &[usize]) {
        let mut used = vec![0u32; graph.edge_count()];
        for pair in route.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            // Any unused parallel edge will do.
            let edge = graph
                .adjacency(a)
                .iter()
                .copied()
                .find(|&e| graph.opposite(e, a) == b && used[e] < multiplicity.get(e))
                .unwrap();
            used[edge] += 1;
        }
        for (e, &count) in used.iter().enumerate() {
            assert_eq!(count, multiplicity.get(e), "edge {e}");
        }
    }

    #[test]
    fn triangle() {
        let g = unit_graph(3, &[(0, 1), (1, 2), (2, 0)]);
        let mut tour = EulerTour::new(&g, Multiplicity::for_graph(&g));
        let route = tour.tour(0);
        assert_eq!(route, vec![0, 1, 2, 0]);
        assert!(tour.remaining().is_exhausted());
    }

    #[test]
    fn isolated_root_is_trivial() {
        let g = unit_graph(1, &[]);
        let mut tour = EulerTour::new(&g, Multiplicity::for_graph(&g));
        assert_eq!(tour.tour(0), vec![0]);
    }

    #[test]
    fn cycle_walk_stops_when_stuck() {
        let g = unit_graph(3, &[(0, 1), (1, 2), (2, 0)]);
        let mut tour = EulerTour::new(&g, Multiplicity::for_graph(&g));
        assert_eq!(tour.cycle_walk(1), vec![1, 0, 2, 1]);
        assert_eq!(tour.cycle_walk(1), vec![1]);
        assert!(tour.into_remaining().is_exhausted());
    }

    #[test]
    fn bowtie_splices_second_cycle() {
        // Two triangles sharing vertex 0.
        let edges = [(0, 1), (1, 2), (2, 0), (0, 3), (3, 4), (4, 0)];
        let g = unit_graph(5, &edges);
        let m = Multiplicity::for_graph(&g);
        let mut tour = EulerTour::new(&g, m.clone());
        let route = tour.tour(0);
        assert_eq!(route.len(), 7);
        assert_eq!(route.first(), route.last());
        assert_covers(&g, &m, &route);
        assert!(tour.remaining().is_exhausted());
    }

    #[test]
    fn splice_in_the_middle_of_a_cycle() {
        // Square 0-1-2-3 with a triangle 2-4-5 hanging off vertex 2.
        let edges = [(0, 1), (1, 2), (2, 3), (3, 0), (2, 4), (4, 5), (5, 2)];
        let g = unit_graph(6, &edges);
        let m = Multiplicity::for_graph(&g);
        let mut tour = EulerTour::new(&g, m.clone());
        let route = tour.tour(0);
        assert_eq!(route.len(), 8);
        assert_eq!(route, vec![0, 1, 2, 4, 5, 2, 3, 0]);
        assert_covers(&g, &m, &route);
    }

    #[test]
    fn doubled_edges_are_walked_twice() {
        let g = unit_graph(3, &[(0, 1), (1, 2)]);
        let mut m = Multiplicity::for_graph(&g);
        m.flip_doubling(0);
        m.flip_doubling(1);
        let mut tour = EulerTour::new(&g, m.clone());
        let route = tour.tour(0);
        assert_eq!(route, vec![0, 1, 2, 1, 0]);
        assert_covers(&g, &m, &route);
    }

    #[test]
    fn self_loop_is_walked() {
        let g = unit_graph(2, &[(0, 1), (1, 1), (1, 0)]);
        let m = Multiplicity::for_graph(&g);
        let mut tour = EulerTour::new(&g, m.clone());
        let route = tour.tour(0);
        assert_eq!(route.len(), 4);
        assert_covers(&g, &m, &route);
        assert!(tour.remaining().is_exhausted());
    }

    #[test]
    fn long_chain_does_not_recurse() {
        // A long doubled path: splicing depth grows with length.
        let n = 20_000;
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        let g = unit_graph(n, &edges);
        let mut m = Multiplicity::for_graph(&g);
        for e in 0..g.edge_count() {
            m.flip_doubling(e);
        }
        let mut tour = EulerTour::new(&g, m);
        let route = tour.tour(0);
        assert_eq!(route.len(), 2 * (n - 1) + 1);
        assert!(tour.remaining().is_exhausted());
    }
}
