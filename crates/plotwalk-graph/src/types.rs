//! Shared types for the plotwalk route solver.

use serde::{Deserialize, Serialize};

use crate::graph::RouteGraph;

/// A 2D point in drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Chebyshev (max-axis) distance to another point.
    ///
    /// This is the travel time of a plotter whose two axes move
    /// simultaneously at the same speed.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> f64 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// A payload that exposes planar coordinates.
///
/// This is the boundary to motion control: anything that can report an
/// `x`/`y` position can be turned into a sequence of relative moves with
/// [`relative_moves`].
pub trait Planar {
    /// Horizontal position.
    fn x(&self) -> f64;
    /// Vertical position.
    fn y(&self) -> f64;
}

impl Planar for Point {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}

impl<P: Planar + ?Sized> Planar for &P {
    fn x(&self) -> f64 {
        (**self).x()
    }

    fn y(&self) -> f64 {
        (**self).y()
    }
}

/// A relative displacement between two consecutive route points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Horizontal displacement.
    pub dx: f64,
    /// Vertical displacement.
    pub dy: f64,
}

/// Convert an ordered point sequence into relative moves.
///
/// Returns one [`Move`] per consecutive pair, so `points.len() - 1`
/// moves for a non-empty input and none for an empty one.
#[must_use]
pub fn relative_moves<P: Planar>(points: &[P]) -> Vec<Move> {
    points
        .windows(2)
        .map(|pair| Move {
            dx: pair[1].x() - pair[0].x(),
            dy: pair[1].y() - pair[0].y(),
        })
        .collect()
}

/// Distance metric used to weight drawing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Metric {
    /// Straight-line length of the segment.
    #[default]
    Euclidean,
    /// Longest axis displacement of the segment.
    Chebyshev,
}

impl Metric {
    /// Measure the distance between two points under this metric.
    #[must_use]
    pub fn distance(self, a: Point, b: Point) -> f64 {
        match self {
            Self::Euclidean => a.distance(b),
            Self::Chebyshev => a.chebyshev_distance(b),
        }
    }
}

/// A line drawing: points plus the segments connecting them.
///
/// This is the on-disk input format read by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    /// Segment endpoints.
    pub points: Vec<Point>,
    /// Segments as pairs of indices into `points`.
    pub edges: Vec<(usize, usize)>,
    /// How segment lengths are measured.
    #[serde(default)]
    pub metric: Metric,
}

impl Drawing {
    /// Build the route graph for this drawing.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidIndex`] if a segment references a
    /// point that does not exist.
    pub fn to_graph(&self) -> Result<RouteGraph<Point>, RouteError> {
        let metric = self.metric;
        RouteGraph::build(self.points.iter().copied(), &self.edges, |a, b| {
            metric.distance(*a, *b)
        })
    }

    /// Total length of all segments under the drawing's metric.
    ///
    /// Segments with out-of-range indices are ignored.
    #[must_use]
    pub fn segment_length(&self) -> f64 {
        self.edges
            .iter()
            .filter_map(|&(a, b)| Some((*self.points.get(a)?, *self.points.get(b)?)))
            .map(|(a, b)| self.metric.distance(a, b))
            .sum()
    }
}

/// Selects how odd-degree vertices are paired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Greedy heuristic. Polynomial, not always optimal.
    #[default]
    Greedy,
    /// Branch-and-bound search for the minimum-weight matching.
    ///
    /// Exponential in the number of odd vertices.
    Exact,
    /// [`Exact`](Self::Exact) up to [`SolveConfig::exact_threshold`] odd
    /// vertices, [`Greedy`](Self::Greedy) above it.
    Auto,
}

impl MatchStrategy {
    /// Resolve [`Auto`](Self::Auto) into a concrete strategy for the given
    /// number of odd vertices.
    #[must_use]
    pub const fn resolve(self, odd_vertex_count: usize, exact_threshold: usize) -> Self {
        match self {
            Self::Auto if odd_vertex_count <= exact_threshold => Self::Exact,
            Self::Auto => Self::Greedy,
            other => other,
        }
    }

    /// Short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::Exact => "exact",
            Self::Auto => "auto",
        }
    }
}

/// Configuration for a solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Which matching strategy pairs the odd vertices.
    pub strategy: MatchStrategy,

    /// Largest odd-vertex count for which [`MatchStrategy::Auto`] runs
    /// the exact search.
    pub exact_threshold: usize,
}

impl SolveConfig {
    /// Default matching strategy.
    pub const DEFAULT_STRATEGY: MatchStrategy = MatchStrategy::Greedy;

    /// Default exact-search threshold for [`MatchStrategy::Auto`].
    ///
    /// Around a dozen odd vertices the exact search still finishes in
    /// well under a second; beyond that it grows as (k-1)!!.
    pub const DEFAULT_EXACT_THRESHOLD: usize = 12;
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            strategy: Self::DEFAULT_STRATEGY,
            exact_threshold: Self::DEFAULT_EXACT_THRESHOLD,
        }
    }
}

/// A solved closed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Vertex ids in walk order. The first and last entries are equal.
    pub vertices: Vec<usize>,

    /// Total length of the walk (sum of traversed edge weights).
    pub length: f64,

    /// The matching strategy that actually ran (never `Auto`).
    pub strategy: MatchStrategy,

    /// Number of odd-vertex pairs joined by a retraced path.
    pub matched_pairs: usize,

    /// Total length of the retraced paths chosen by the matching.
    pub matching_weight: f64,
}

impl Route {
    /// Number of vertices in the walk (including the closing vertex).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if the walk has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns `true` if the walk ends where it started.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.vertices.first() == self.vertices.last()
    }

    /// Borrow the payloads of the walk, in order, from the graph that
    /// produced it.
    ///
    /// Vertex ids that do not exist in `graph` are skipped.
    #[must_use]
    pub fn payloads<'g, P>(&self, graph: &'g RouteGraph<P>) -> Vec<&'g P> {
        self.vertices
            .iter()
            .filter_map(|&v| graph.payload(v))
            .collect()
    }
}

/// Errors that can occur while building or solving a route graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum RouteError {
    /// An edge references a vertex that does not exist.
    #[error("edge {edge} references vertex {index}, but only {vertex_count} vertices exist")]
    InvalidIndex {
        /// Position of the offending edge in the input.
        edge: usize,
        /// The out-of-range vertex index.
        index: usize,
        /// Number of vertices available.
        vertex_count: usize,
    },

    /// An edge weight is negative, infinite or NaN.
    #[error("edge {edge} has invalid weight {weight} (must be finite and non-negative)")]
    InvalidWeight {
        /// Position of the offending edge.
        edge: usize,
        /// The rejected weight.
        weight: f64,
    },

    /// Two vertices that must be joined are not connected.
    #[error("graph is disconnected: vertex {to} is unreachable from vertex {from}")]
    DisconnectedGraph {
        /// Vertex the search started from.
        from: usize,
        /// Vertex that could not be reached.
        to: usize,
    },

    /// Consecutive path vertices are not joined by an edge.
    #[error("vertices {from} and {to} are not adjacent")]
    NotAdjacent {
        /// First vertex of the step.
        from: usize,
        /// Second vertex of the step.
        to: usize,
    },

    /// The graph has no vertices, so there is nowhere to start.
    #[error("graph has no vertices")]
    EmptyGraph,

    /// The matching graph admits no perfect matching.
    #[error("no perfect matching exists over {vertex_count} vertices")]
    NoPerfectMatching {
        /// Number of vertices in the matching graph.
        vertex_count: usize,
    },

    /// The exact matching search cannot represent this many vertices.
    #[error("exact matching supports at most {max} vertices, got {vertex_count}")]
    MatchingTooLarge {
        /// Number of vertices in the matching graph.
        vertex_count: usize,
        /// Largest supported vertex count.
        max: usize,
    },
}

/// Result alias for route operations.
pub type Result<T, E = RouteError> = std::result::Result<T, E>;
