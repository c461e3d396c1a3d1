//! The route inspection pipeline: connectivity, T-join, matching,
//! augmentation and tour extraction.
//!
//! Each stage is a separate function so that
//! [`solve_with_diagnostics`](crate::diagnostics::solve_with_diagnostics)
//! can time them individually while [`RouteGraph::solve`] runs them back
//! to back.

use tracing::{debug, warn};

use crate::euler::EulerTour;
use crate::graph::{Multiplicity, RouteGraph};
use crate::matching::MatchGraph;
use crate::tjoin::{TJoinPath, augment, build_tjoin};
use crate::types::{MatchStrategy, Result, Route, RouteError, SolveConfig};

/// Root of every tour.
pub(crate) const ROOT: usize = 0;

/// Check that the graph can be toured at all.
///
/// Returns `Some` with the finished route when there is nothing to walk,
/// `None` when the remaining stages should run.
pub(crate) fn check_connected<P>(
    graph: &RouteGraph<P>,
    config: &SolveConfig,
) -> Result<Option<Route>> {
    if graph.vertex_count() == 0 {
        return Err(RouteError::EmptyGraph);
    }
    if graph.edge_count() == 0 {
        return Ok(Some(Route {
            vertices: vec![ROOT],
            length: 0.0,
            strategy: config.strategy.resolve(0, config.exact_threshold),
            matched_pairs: 0,
            matching_weight: 0.0,
        }));
    }
    if let Some(to) = graph.disconnected_vertex() {
        return Err(RouteError::DisconnectedGraph { from: ROOT, to });
    }
    Ok(None)
}

/// The retrace paths chosen by a matching.
#[derive(Debug, Clone)]
pub(crate) struct Matched {
    pub strategy: MatchStrategy,
    pub paths: Vec<TJoinPath>,
    pub weight: f64,
}

/// Pair up the odd vertices with the configured strategy.
pub(crate) fn match_odd_vertices(
    tjoin: &mut MatchGraph<TJoinPath>,
    config: &SolveConfig,
) -> Result<Matched> {
    let odd = tjoin.size();
    let strategy = config.strategy.resolve(odd, config.exact_threshold);
    if config.strategy == MatchStrategy::Auto && strategy == MatchStrategy::Greedy {
        warn!(
            odd_vertices = odd,
            exact_threshold = config.exact_threshold,
            "too many odd vertices for exact matching, falling back to greedy"
        );
    }

    let paths: Vec<TJoinPath> = match strategy {
        MatchStrategy::Exact => tjoin.match_exact()?,
        MatchStrategy::Greedy | MatchStrategy::Auto => tjoin.match_greedy()?,
    }
    .into_iter()
    .cloned()
    .collect();
    let weight = tjoin.matched_weight();

    debug!(
        strategy = strategy.name(),
        pairs = paths.len(),
        weight,
        "matched odd vertices"
    );
    Ok(Matched {
        strategy,
        paths,
        weight,
    })
}

/// Fresh traversal counts with every matched path doubled.
pub(crate) fn augmented<P>(graph: &RouteGraph<P>, paths: &[TJoinPath]) -> Result<Multiplicity> {
    let mut multiplicity = Multiplicity::for_graph(graph);
    augment(graph, &mut multiplicity, paths)?;
    debug!(doubled_edges = multiplicity.doubled_count(), "augmented graph");
    Ok(multiplicity)
}

/// Walk every edge from [`ROOT`], consuming `multiplicity`.
///
/// Fails if some edge could not be reached, which means the graph was
/// not connected after all.
pub(crate) fn extract_tour<P>(
    graph: &RouteGraph<P>,
    multiplicity: Multiplicity,
) -> Result<Vec<usize>> {
    let mut tour = EulerTour::new(graph, multiplicity);
    let vertices = tour.tour(ROOT);
    if let Some(edge) = tour.remaining().first_remaining() {
        let (to, _) = graph.endpoints(edge);
        return Err(RouteError::DisconnectedGraph { from: ROOT, to });
    }
    Ok(vertices)
}

impl<P> RouteGraph<P> {
    /// Find a shortest closed walk that traverses every edge at least
    /// once.
    ///
    /// The walk starts and ends at vertex 0. Edges on the retrace paths
    /// picked by the matching are traversed exactly twice, all others
    /// exactly once. The graph itself is not modified, so it can be
    /// solved again (with the same or another config) at any time.
    ///
    /// # Errors
    ///
    /// - [`RouteError::EmptyGraph`] if there are no vertices.
    /// - [`RouteError::DisconnectedGraph`] if some vertex is not
    ///   connected to vertex 0.
    /// - [`RouteError::MatchingTooLarge`] if the exact strategy is forced
    ///   on more odd vertices than it supports.
    pub fn solve(&self, config: &SolveConfig) -> Result<Route> {
        if let Some(route) = check_connected(self, config)? {
            return Ok(route);
        }
        let mut tjoin = build_tjoin(self)?;
        let matched = match_odd_vertices(&mut tjoin, config)?;
        let multiplicity = augmented(self, &matched.paths)?;
        let length = multiplicity.total_length(self);
        let vertices = extract_tour(self, multiplicity)?;

        debug!(
            route_vertices = vertices.len(),
            length,
            input_length = self.total_weight(),
            "solved route"
        );
        Ok(Route {
            vertices,
            length,
            strategy: matched.strategy,
            matched_pairs: matched.paths.len(),
            matching_weight: matched.weight,
        })
    }

    /// Like [`solve`](Self::solve), but returns the payloads of the walk
    /// instead of vertex ids.
    ///
    /// # Errors
    ///
    /// Same as [`solve`](Self::solve).
    pub fn solve_payloads(&self, config: &SolveConfig) -> Result<Vec<P>>
    where
        P: Clone,
    {
        let route = self.solve(config)?;
        Ok(route.payloads(self).into_iter().cloned().collect())
    }
}
