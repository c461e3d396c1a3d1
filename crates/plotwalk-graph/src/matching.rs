//! Minimum-weight perfect matching over a small weighted graph.
//!
//! [`MatchGraph`] is independent of the route solver: vertices are
//! `0..size`, every edge carries an arbitrary payload, and a matching
//! returns the payloads of the chosen edges.
//!
//! Two strategies are offered:
//!
//! - [`MatchGraph::match_exact`]: branch-and-bound. Always optimal, but
//!   the search tree has up to (k-1)!! leaves for k vertices.
//! - [`MatchGraph::match_greedy`]: repeatedly takes the edge that is
//!   cheapest relative to its endpoints' alternatives. Polynomial, never
//!   better than the exact optimum.

use std::cmp::Ordering;

use tracing::trace;

use crate::types::{Result, RouteError};

/// Largest vertex count [`MatchGraph::match_exact`] accepts.
///
/// The search tracks covered vertices in a `u64` bitmask.
pub const MAX_EXACT_VERTICES: usize = 64;

#[derive(Debug, Clone)]
struct MatchEdge<T> {
    a: usize,
    b: usize,
    weight: f64,
    payload: T,
}

impl<T> MatchEdge<T> {
    const fn opposite(&self, v: usize) -> usize {
        if self.a == v { self.b } else { self.a }
    }

    const fn is_loop(&self) -> bool {
        self.a == self.b
    }

    /// Endpoint pair with the smaller id first; the greedy tie-break key.
    fn key(&self) -> (usize, usize) {
        (self.a.min(self.b), self.a.max(self.b))
    }
}

/// A weighted graph to be perfectly matched.
///
/// Each vertex keeps a running *weighted degree* (sum of incident edge
/// weights) which the greedy strategy uses as its preference signal.
#[derive(Debug, Clone)]
pub struct MatchGraph<T> {
    weighted_degree: Vec<f64>,
    edges: Vec<MatchEdge<T>>,
    adjacency: Vec<Vec<usize>>,
    matched: Vec<bool>,
}

impl<T> MatchGraph<T> {
    /// An edgeless graph over vertices `0..size`.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            weighted_degree: vec![0.0; size],
            edges: Vec::new(),
            adjacency: vec![Vec::new(); size],
            matched: Vec::new(),
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn size(&self) -> usize {
        self.weighted_degree.len()
    }

    /// Number of edges added so far.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Add an edge between `a` and `b` and return its id.
    ///
    /// Self-loops are accepted but can never be part of a matching.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidIndex`] if either endpoint is out of
    /// range, or [`RouteError::InvalidWeight`] if `weight` is negative or
    /// not finite.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64, payload: T) -> Result<usize> {
        let edge = self.edges.len();
        let vertex_count = self.size();
        if let Some(index) = [a, b].into_iter().find(|&i| i >= vertex_count) {
            return Err(RouteError::InvalidIndex {
                edge,
                index,
                vertex_count,
            });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(RouteError::InvalidWeight { edge, weight });
        }

        self.weighted_degree[a] += weight;
        self.weighted_degree[b] += weight;
        self.adjacency[a].push(edge);
        if a != b {
            self.adjacency[b].push(edge);
        }
        self.edges.push(MatchEdge {
            a,
            b,
            weight,
            payload,
        });
        self.matched.push(false);
        Ok(edge)
    }

    /// Sum of the weights of edges incident to `v`.
    #[must_use]
    pub fn weighted_degree(&self, v: usize) -> f64 {
        self.weighted_degree.get(v).copied().unwrap_or(0.0)
    }

    /// Whether edge `e` is part of the last computed matching.
    #[must_use]
    pub fn is_matched(&self, e: usize) -> bool {
        self.matched.get(e).copied().unwrap_or(false)
    }

    /// Payload of edge `e`.
    #[must_use]
    pub fn payload(&self, e: usize) -> Option<&T> {
        self.edges.get(e).map(|edge| &edge.payload)
    }

    /// Weight of edge `e`.
    #[must_use]
    pub fn weight(&self, e: usize) -> Option<f64> {
        self.edges.get(e).map(|edge| edge.weight)
    }

    /// Total weight of the last computed matching.
    #[must_use]
    pub fn matched_weight(&self) -> f64 {
        self.edges
            .iter()
            .zip(&self.matched)
            .filter(|&(_, &m)| m)
            .map(|(edge, _)| edge.weight)
            .sum()
    }

    /// Payloads of the matched edges, in edge insertion order.
    #[must_use]
    pub fn matched_payloads(&self) -> Vec<&T> {
        self.edges
            .iter()
            .zip(&self.matched)
            .filter(|&(_, &m)| m)
            .map(|(edge, _)| &edge.payload)
            .collect()
    }

    /// Forget the last matching and recompute every weighted degree
    /// from the edge list.
    pub fn reset(&mut self) {
        self.matched.fill(false);
        self.weighted_degree.fill(0.0);
        for edge in &self.edges {
            self.weighted_degree[edge.a] += edge.weight;
            self.weighted_degree[edge.b] += edge.weight;
        }
    }

    /// Find a minimum-weight perfect matching by branch-and-bound.
    ///
    /// The search always branches on the lowest uncovered vertex and
    /// tries its edges cheapest first, abandoning a branch as soon as its
    /// accumulated weight reaches the best complete matching found so
    /// far. The partial matching travels down the recursion as a bitmask
    /// of covered vertices plus a linked list of chosen edges; nothing on
    /// the graph is touched until the optimum is known.
    ///
    /// Returns the payloads of the matched edges in edge insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::MatchingTooLarge`] for more than
    /// [`MAX_EXACT_VERTICES`] vertices and
    /// [`RouteError::NoPerfectMatching`] if no perfect matching exists.
    pub fn match_exact(&mut self) -> Result<Vec<&T>> {
        let vertex_count = self.size();
        if vertex_count > MAX_EXACT_VERTICES {
            return Err(RouteError::MatchingTooLarge {
                vertex_count,
                max: MAX_EXACT_VERTICES,
            });
        }
        self.matched.fill(false);

        let incident: Vec<Vec<usize>> = self
            .adjacency
            .iter()
            .map(|edges| {
                let mut sorted: Vec<usize> = edges
                    .iter()
                    .copied()
                    .filter(|&e| !self.edges[e].is_loop())
                    .collect();
                sorted.sort_by(|&x, &y| {
                    self.edges[x]
                        .weight
                        .total_cmp(&self.edges[y].weight)
                        .then(x.cmp(&y))
                });
                sorted
            })
            .collect();

        let all_covered = if vertex_count == MAX_EXACT_VERTICES {
            u64::MAX
        } else {
            (1u64 << vertex_count) - 1
        };

        let mut search = ExactSearch {
            edges: &self.edges,
            incident: &incident,
            all_covered,
            best_weight: f64::INFINITY,
            best_edges: None,
            nodes: 0,
        };
        search.descend(0, 0.0, None);
        let nodes = search.nodes;
        let best_weight = search.best_weight;

        let Some(best_edges) = search.best_edges else {
            return Err(RouteError::NoPerfectMatching { vertex_count });
        };
        for e in best_edges {
            self.matched[e] = true;
        }
        trace!(vertex_count, nodes, best_weight, "exact matching finished");

        Ok(self.matched_payloads())
    }

    /// Find a low-weight perfect matching greedily.
    ///
    /// Each round picks the remaining candidate edge with the highest
    /// score `wdeg(a) + wdeg(b) - 2 * weight`, i.e. the edge that is
    /// cheapest compared to the other options of its endpoints. The pick
    /// is matched, and every candidate touching either endpoint is
    /// dropped, lowering the weighted degree of its far endpoint.
    ///
    /// Ties go to the lowest `(min, max)` endpoint pair, then the lowest
    /// edge id, so results are reproducible. Weighted degrees are updated
    /// on a scratch copy; [`weighted_degree`](Self::weighted_degree) is
    /// unaffected.
    ///
    /// Returns the payloads of the matched edges in edge insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NoPerfectMatching`] if the picks run out of
    /// candidates before every vertex is covered.
    pub fn match_greedy(&mut self) -> Result<Vec<&T>> {
        let vertex_count = self.size();
        self.matched.fill(false);

        let mut degree = self.weighted_degree.clone();
        let mut candidate: Vec<bool> = self.edges.iter().map(|e| !e.is_loop()).collect();
        let mut covered = vec![false; vertex_count];

        loop {
            let best = self
                .edges
                .iter()
                .enumerate()
                .filter(|&(e, _)| candidate[e])
                .map(|(e, edge)| {
                    let score = 2.0f64.mul_add(-edge.weight, degree[edge.a] + degree[edge.b]);
                    (e, score)
                })
                .max_by(|&(x, score_x), &(y, score_y)| {
                    score_x.total_cmp(&score_y).then_with(|| {
                        // Lower key wins, so compare reversed.
                        self.edges[y]
                            .key()
                            .cmp(&self.edges[x].key())
                            .then(y.cmp(&x))
                    })
                });

            let Some((picked, score)) = best else {
                break;
            };
            let (a, b) = (self.edges[picked].a, self.edges[picked].b);
            trace!(a, b, score, "greedy pick");

            self.matched[picked] = true;
            covered[a] = true;
            covered[b] = true;

            for v in [a, b] {
                for &e in &self.adjacency[v] {
                    if candidate[e] {
                        candidate[e] = false;
                        let far = self.edges[e].opposite(v);
                        degree[far] -= self.edges[e].weight;
                    }
                }
            }
        }

        if covered.iter().any(|&c| !c) {
            self.matched.fill(false);
            return Err(RouteError::NoPerfectMatching { vertex_count });
        }

        Ok(self.matched_payloads())
    }
}

/// One chosen edge in the current branch, linked to the choices above it.
struct Chosen<'a> {
    edge: usize,
    parent: Option<&'a Chosen<'a>>,
}

impl Chosen<'_> {
    fn edges(&self) -> Vec<usize> {
        let mut edges = vec![self.edge];
        let mut link = self.parent;
        while let Some(chosen) = link {
            edges.push(chosen.edge);
            link = chosen.parent;
        }
        edges
    }
}

/// Branch-and-bound state for [`MatchGraph::match_exact`].
struct ExactSearch<'g, T> {
    edges: &'g [MatchEdge<T>],
    /// Non-loop incident edges per vertex, cheapest first.
    incident: &'g [Vec<usize>],
    all_covered: u64,
    best_weight: f64,
    best_edges: Option<Vec<usize>>,
    nodes: u64,
}

impl<T> ExactSearch<'_, T> {
    fn descend(&mut self, covered: u64, weight: f64, chosen: Option<&Chosen<'_>>) {
        self.nodes += 1;

        if covered == self.all_covered {
            if weight < self.best_weight {
                self.best_weight = weight;
                self.best_edges = Some(chosen.map_or_else(Vec::new, |c| c.edges()));
            }
            return;
        }

        // covered != all_covered, so the lowest clear bit is a vertex.
        let vertex = (!covered).trailing_zeros() as usize;
        let covered = covered | (1 << vertex);
        let (edges, incident) = (self.edges, self.incident);

        for &e in &incident[vertex] {
            let edge = &edges[e];
            let other = edge.opposite(vertex);
            if covered & (1 << other) != 0 {
                continue;
            }
            let next_weight = weight + edge.weight;
            if next_weight.partial_cmp(&self.best_weight) != Some(Ordering::Less) {
                // Edges are sorted, so every later one is at least as heavy.
                break;
            }
            let link = Chosen {
                edge: e,
                parent: chosen,
            };
            self.descend(covered | (1 << other), next_weight, Some(&link));
        }
    }
}
