//! Single-source shortest paths (Dijkstra) with predecessor links.
//!
//! `petgraph::algo::dijkstra` only reports distances; the T-join needs
//! the concrete paths, so this keeps a predecessor per vertex. The heap
//! uses lazy deletion: a vertex may be queued several times and stale
//! entries are skipped when popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::graph::RouteGraph;

/// Heap entry ordered so that [`BinaryHeap`] pops the smallest distance.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    vertex: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// The shortest-path tree rooted at one source vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPaths {
    source: usize,
    distance: Vec<f64>,
    /// `(previous vertex, edge used)` on the shortest path to each vertex.
    predecessor: Vec<Option<(usize, usize)>>,
}

impl ShortestPaths {
    /// The vertex the search started from.
    #[must_use]
    pub const fn source(&self) -> usize {
        self.source
    }

    /// Shortest distance from the source to `v`.
    ///
    /// `f64::INFINITY` if `v` is unreachable or unknown.
    #[must_use]
    pub fn distance(&self, v: usize) -> f64 {
        self.distance.get(v).copied().unwrap_or(f64::INFINITY)
    }

    /// Returns `true` if `v` can be reached from the source.
    #[must_use]
    pub fn is_reachable(&self, v: usize) -> bool {
        self.distance(v).is_finite()
    }

    /// The vertex preceding `v` on its shortest path, and the edge
    /// between them. `None` for the source and for unreachable vertices.
    #[must_use]
    pub fn predecessor(&self, v: usize) -> Option<(usize, usize)> {
        self.predecessor.get(v).copied().flatten()
    }

    /// The vertex sequence of the shortest path from the source to
    /// `target`, both inclusive.
    ///
    /// Built by following predecessor links back from `target` and
    /// reversing. Returns `None` if `target` is unreachable.
    #[must_use]
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if !self.is_reachable(target) {
            return None;
        }

        let mut path = vec![target];
        let mut current = target;
        while current != self.source {
            // The tree has at most one link per vertex, so a longer walk
            // means the links are corrupt.
            if path.len() > self.distance.len() {
                return None;
            }
            let (previous, _) = self.predecessor(current)?;
            path.push(previous);
            current = previous;
        }
        path.reverse();
        Some(path)
    }
}

/// Run Dijkstra's algorithm from `source`.
///
/// Every vertex starts unvisited at infinite distance with no
/// predecessor. A `source` outside the graph yields a tree in which
/// nothing is reachable.
///
/// Runs in O((V + E) log E). Among equally short paths the one found
/// first wins; callers must not rely on which.
#[must_use]
pub fn shortest_paths<P>(graph: &RouteGraph<P>, source: usize) -> ShortestPaths {
    let n = graph.vertex_count();
    let mut distance = vec![f64::INFINITY; n];
    let mut predecessor = vec![None; n];
    let mut visited = vec![false; n];

    let mut heap = BinaryHeap::new();
    if source < n {
        distance[source] = 0.0;
        heap.push(Candidate {
            distance: 0.0,
            vertex: source,
        });
    }

    while let Some(Candidate {
        distance: current_distance,
        vertex: current,
    }) = heap.pop()
    {
        if visited[current] {
            continue;
        }
        visited[current] = true;

        for &edge in graph.adjacency(current) {
            let next = graph.opposite(edge, current);
            let candidate = current_distance + graph.weight(edge);
            if candidate < distance[next] {
                distance[next] = candidate;
                predecessor[next] = Some((current, edge));
                heap.push(Candidate {
                    distance: candidate,
                    vertex: next,
                });
            }
        }
    }

    ShortestPaths {
        source,
        distance,
        predecessor,
    }
}
