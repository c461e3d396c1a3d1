//! Solve diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`solve_with_diagnostics`] runs the same stages as
//! [`RouteGraph::solve`] and records how long each took and what it
//! produced. Useful for comparing matching strategies and for seeing
//! where time goes on large drawings.
//!
//! The crate never reads a clock itself. Callers pass a [`Clock`], which
//! keeps the solver free of platform time APIs and lets tests use a fake.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::graph::RouteGraph;
use crate::solve::{augmented, check_connected, extract_tour, match_odd_vertices};
use crate::tjoin::build_tjoin;
use crate::types::{MatchStrategy, Result, Route, SolveConfig};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// A point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single solve.
///
/// Stages after the connectivity check are `None` when the graph had no
/// edges and the trivial route was returned directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    /// Stage 1: connectivity check.
    pub connectivity: StageDiagnostics,
    /// Stage 2: shortest paths between odd vertices.
    pub tjoin: Option<StageDiagnostics>,
    /// Stage 3: matching the odd vertices.
    pub matching: Option<StageDiagnostics>,
    /// Stage 4: doubling the matched paths.
    pub augmentation: Option<StageDiagnostics>,
    /// Stage 5: Euler tour extraction.
    pub tour: Option<StageDiagnostics>,
    /// Total wall-clock duration of the solve (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: SolveSummary,
}

/// Diagnostics for a single solve stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Connectivity check metrics.
    Connectivity {
        /// Number of vertices.
        vertex_count: usize,
        /// Number of edges.
        edge_count: usize,
    },
    /// T-join metrics.
    TJoin {
        /// Number of odd-degree vertices (one Dijkstra run each).
        odd_vertex_count: usize,
        /// Number of candidate paths handed to the matcher.
        candidate_paths: usize,
    },
    /// Matching metrics.
    Matching {
        /// The strategy that ran.
        strategy: MatchStrategy,
        /// Number of matched pairs.
        matched_pairs: usize,
        /// Total length of the matched paths.
        weight: f64,
    },
    /// Augmentation metrics.
    Augmentation {
        /// Number of edges that will be walked twice.
        doubled_edges: usize,
        /// Length of the walk after doubling.
        augmented_length: f64,
    },
    /// Tour extraction metrics.
    Tour {
        /// Vertices in the closed walk, including the closing vertex.
        route_vertex_count: usize,
    },
}

/// High-level summary of a solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveSummary {
    /// Number of vertices.
    pub vertex_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// Number of odd-degree vertices.
    pub odd_vertex_count: usize,
    /// Number of retraced odd-vertex pairs.
    pub matched_pairs: usize,
    /// The matching strategy that ran.
    pub strategy: MatchStrategy,
    /// Sum of all edge weights.
    pub input_length: f64,
    /// Length of the closed walk.
    pub route_length: f64,
    /// `route_length / input_length`; 1.0 means nothing was retraced.
    pub overhead_ratio: f64,
}

impl SolveDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Route Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Graph: {} vertices, {} edges ({} odd)",
            self.summary.vertex_count, self.summary.edge_count, self.summary.odd_vertex_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Strategy: {}  |  Input length: {:.3}  |  Route length: {:.3} (x{:.3})",
            self.summary.strategy.name(),
            self.summary.input_length,
            self.summary.route_length,
            self.summary.overhead_ratio,
        ));

        lines.join("\n")
    }

    /// The stages that ran, in order, with their display names.
    #[must_use]
    pub fn stages(&self) -> Vec<(&'static str, &StageDiagnostics)> {
        let mut stages = vec![("Connectivity", &self.connectivity)];
        let optional = [
            ("T-Join", &self.tjoin),
            ("Matching", &self.matching),
            ("Augmentation", &self.augmentation),
            ("Tour", &self.tour),
        ];
        for (name, stage) in optional {
            if let Some(diag) = stage {
                stages.push((name, diag));
            }
        }
        stages
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Connectivity {
            vertex_count,
            edge_count,
        } => format!("{vertex_count} vertices, {edge_count} edges"),
        StageMetrics::TJoin {
            odd_vertex_count,
            candidate_paths,
        } => format!("{odd_vertex_count} odd vertices, {candidate_paths} paths"),
        StageMetrics::Matching {
            strategy,
            matched_pairs,
            weight,
        } => format!("{} {matched_pairs} pairs, weight={weight:.3}", strategy.name()),
        StageMetrics::Augmentation {
            doubled_edges,
            augmented_length,
        } => format!("{doubled_edges} doubled, length={augmented_length:.3}"),
        StageMetrics::Tour { route_vertex_count } => format!("{route_vertex_count} vertices"),
    }
}

/// Time one stage: run `f`, returning its output and elapsed duration.
fn timed<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let output = f();
    (output, clock.elapsed(&start))
}

/// Solve `graph` like [`RouteGraph::solve`], collecting per-stage
/// diagnostics.
///
/// # Errors
///
/// Same as [`RouteGraph::solve`]. No diagnostics are returned for a
/// failed solve.
pub fn solve_with_diagnostics<P, C: Clock>(
    graph: &RouteGraph<P>,
    config: &SolveConfig,
    clock: &C,
) -> Result<(Route, SolveDiagnostics)> {
    let total_start = clock.now();
    let input_length = graph.total_weight();
    let mut summary = SolveSummary {
        vertex_count: graph.vertex_count(),
        edge_count: graph.edge_count(),
        odd_vertex_count: 0,
        matched_pairs: 0,
        strategy: config.strategy.resolve(0, config.exact_threshold),
        input_length,
        route_length: 0.0,
        overhead_ratio: 1.0,
    };

    // Stage 1: connectivity.
    let (trivial, duration) = timed(clock, || check_connected(graph, config));
    let connectivity = StageDiagnostics {
        duration,
        metrics: StageMetrics::Connectivity {
            vertex_count: summary.vertex_count,
            edge_count: summary.edge_count,
        },
    };
    if let Some(route) = trivial? {
        let diagnostics = SolveDiagnostics {
            connectivity,
            tjoin: None,
            matching: None,
            augmentation: None,
            tour: None,
            total_duration: clock.elapsed(&total_start),
            summary,
        };
        return Ok((route, diagnostics));
    }

    // Stage 2: T-join.
    let (tjoin_graph, duration) = timed(clock, || build_tjoin(graph));
    let mut tjoin_graph = tjoin_graph?;
    summary.odd_vertex_count = tjoin_graph.size();
    let tjoin = StageDiagnostics {
        duration,
        metrics: StageMetrics::TJoin {
            odd_vertex_count: tjoin_graph.size(),
            candidate_paths: tjoin_graph.edge_count(),
        },
    };

    // Stage 3: matching.
    let (matched, duration) = timed(clock, || match_odd_vertices(&mut tjoin_graph, config));
    let matched = matched?;
    summary.matched_pairs = matched.paths.len();
    summary.strategy = matched.strategy;
    let matching = StageDiagnostics {
        duration,
        metrics: StageMetrics::Matching {
            strategy: matched.strategy,
            matched_pairs: matched.paths.len(),
            weight: matched.weight,
        },
    };

    // Stage 4: augmentation.
    let (multiplicity, duration) = timed(clock, || augmented(graph, &matched.paths));
    let multiplicity = multiplicity?;
    let length = multiplicity.total_length(graph);
    let augmentation = StageDiagnostics {
        duration,
        metrics: StageMetrics::Augmentation {
            doubled_edges: multiplicity.doubled_count(),
            augmented_length: length,
        },
    };

    // Stage 5: tour.
    let (vertices, duration) = timed(clock, || extract_tour(graph, multiplicity));
    let vertices = vertices?;
    let tour = StageDiagnostics {
        duration,
        metrics: StageMetrics::Tour {
            route_vertex_count: vertices.len(),
        },
    };

    summary.route_length = length;
    summary.overhead_ratio = if input_length > 0.0 {
        length / input_length
    } else {
        1.0
    };

    let route = Route {
        vertices,
        length,
        strategy: matched.strategy,
        matched_pairs: matched.paths.len(),
        matching_weight: matched.weight,
    };
    let diagnostics = SolveDiagnostics {
        connectivity,
        tjoin: Some(tjoin),
        matching: Some(matching),
        augmentation: Some(augmentation),
        tour: Some(tour),
        total_duration: clock.elapsed(&total_start),
        summary,
    };
    Ok((route, diagnostics))
}
