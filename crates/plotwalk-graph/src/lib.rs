//! plotwalk-graph: route inspection solver for plotter paths (sans-IO).
//!
//! Given a line drawing as a graph (points joined by segments), finds a
//! shortest closed walk that draws every segment at least once, so a pen
//! plotter can trace the whole drawing without lifting the pen:
//! odd vertices -> shortest paths -> minimum-weight matching ->
//! edge doubling -> Euler tour.
//!
//! The graph is immutable once built; all per-solve state lives in
//! tables owned by the solve call, so [`RouteGraph::solve`] takes `&self`
//! and may run concurrently on a shared graph.
//!
//! This crate has **no I/O dependencies**. Reading drawings and writing
//! SVG/JSON lives in `plotwalk-export` and the `plotwalk` binary.

pub mod diagnostics;
pub mod euler;
pub mod graph;
pub mod matching;
pub mod shortest_path;
pub mod tjoin;
pub mod types;

mod solve;

pub use graph::{Multiplicity, RouteGraph};
pub use matching::{MAX_EXACT_VERTICES, MatchGraph};
pub use types::{
    Drawing, MatchStrategy, Metric, Move, Planar, Point, Result, Route, RouteError, SolveConfig,
    relative_moves,
};
