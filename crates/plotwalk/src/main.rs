//! plotwalk: solve a line drawing into a single closed plotter route.
//!
//! Reads a drawing (points plus segments) from a JSON file, finds a
//! shortest closed walk that draws every segment, and prints per-stage
//! diagnostics. Optionally writes the route as SVG or JSON.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin plotwalk -- [OPTIONS] <DRAWING>
//! ```
//!
//! The drawing file looks like:
//!
//! ```text
//! {"points": [{"x": 0, "y": 0}, {"x": 10, "y": 0}], "edges": [[0, 1]], "metric": "Chebyshev"}
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (e.g. `RUST_LOG=plotwalk_graph=debug`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use plotwalk_graph::diagnostics::{Clock, SolveDiagnostics, solve_with_diagnostics};
use plotwalk_graph::{Drawing, MatchStrategy, Route, SolveConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Solve a line drawing into one closed pen-plotter route.
///
/// Every segment of the drawing is drawn at least once; segments on the
/// cheapest retrace paths are drawn twice so the pen never lifts.
#[derive(Parser)]
#[command(name = "plotwalk", version)]
struct Cli {
    /// Path to the drawing JSON file.
    drawing_path: PathBuf,

    /// Matching strategy for pairing odd vertices.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_STRATEGY)]
    strategy: Strategy,

    /// Largest odd-vertex count for which `auto` runs the exact search.
    #[arg(long, default_value_t = SolveConfig::DEFAULT_EXACT_THRESHOLD)]
    exact_threshold: usize,

    /// Full solve config as a JSON string.
    ///
    /// When provided, `--strategy` and `--exact-threshold` are ignored.
    /// The JSON must be a valid `SolveConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the route as SVG to this file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the route as JSON to this file.
    #[arg(long)]
    route_json: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,
}

/// Matching strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Greedy pairing (fast, not always optimal).
    Greedy,
    /// Branch-and-bound (optimal, exponential).
    Exact,
    /// Exact up to `--exact-threshold` odd vertices, greedy above.
    Auto,
}

/// Maps a [`MatchStrategy`] to the local CLI [`Strategy`] enum.
const fn strategy_from_config(s: MatchStrategy) -> Strategy {
    match s {
        MatchStrategy::Greedy => Strategy::Greedy,
        MatchStrategy::Exact => Strategy::Exact,
        MatchStrategy::Auto => Strategy::Auto,
    }
}

/// The CLI default strategy, derived from
/// [`SolveConfig::DEFAULT_STRATEGY`] so the two cannot silently diverge.
const CLI_DEFAULT_STRATEGY: Strategy = strategy_from_config(SolveConfig::DEFAULT_STRATEGY);

/// Build a [`SolveConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<SolveConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(SolveConfig {
        strategy: match cli.strategy {
            Strategy::Greedy => MatchStrategy::Greedy,
            Strategy::Exact => MatchStrategy::Exact,
            Strategy::Auto => MatchStrategy::Auto,
        },
        exact_threshold: cli.exact_threshold,
    })
}

/// Read and parse the drawing file.
fn read_drawing(path: &Path) -> Result<Drawing, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let drawing = match read_drawing(&cli.drawing_path) {
        Ok(d) => d,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let graph = match drawing.to_graph() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Invalid drawing: {e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Drawing: {} ({} points, {} segments)",
        cli.drawing_path.display(),
        graph.vertex_count(),
        graph.edge_count(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match solve_with_diagnostics(&graph, &config, &StdClock) {
            Ok((route, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write outputs on the first run only.
                if run == 0 {
                    write_outputs(&cli, &config, &drawing, &route);
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Solve error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write the SVG and route JSON files requested on the command line.
///
/// Failures are reported but do not abort the run.
fn write_outputs(cli: &Cli, config: &SolveConfig, drawing: &Drawing, route: &Route) {
    let points: Vec<_> = route
        .vertices
        .iter()
        .filter_map(|&v| drawing.points.get(v).copied())
        .collect();

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .drawing_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("plotwalk");
        let desc = format!(
            "strategy={} length={:.3}",
            route.strategy.name(),
            route.length
        );
        let config_json = serde_json::to_string(config).ok();
        let metadata = plotwalk_export::SvgMetadata {
            title: Some(title),
            description: Some(&desc),
            config_json: config_json.as_deref(),
        };
        let svg = plotwalk_export::to_svg(&points, &metadata);
        write_file(svg_path, &svg, "SVG");
    }

    if let Some(ref json_path) = cli.route_json {
        match plotwalk_export::to_route_json(route, &drawing.points) {
            Ok(json) => write_file(json_path, &json, "Route JSON"),
            Err(e) => eprintln!("Error exporting route JSON: {e}"),
        }
    }
}

fn write_file(path: &Path, contents: &str, what: &str) {
    match std::fs::write(path, contents) {
        Ok(()) => {
            info!(path = %path.display(), bytes = contents.len(), "wrote {what}");
            eprintln!(
                "{what} written to {} ({} bytes)",
                path.display(),
                contents.len(),
            );
        }
        Err(e) => {
            eprintln!("Error writing {what} to {}: {e}", path.display());
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&SolveDiagnostics) -> Option<Duration>;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[SolveDiagnostics]) {
    debug!(runs = all_diagnostics.len(), "summarizing runs");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Connectivity", |d| Some(d.connectivity.duration)),
        ("T-Join", |d| d.tjoin.as_ref().map(|s| s.duration)),
        ("Matching", |d| d.matching.as_ref().map(|s| s.duration)),
        ("Augmentation", |d| d.augmentation.as_ref().map(|s| s.duration)),
        ("Tour", |d| d.tour.as_ref().map(|s| s.duration)),
    ];

    for (name, extractor) in stage_extractors {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(extractor)
            .map(|dur| dur.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("plotwalk").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_solve_config() {
        let cli = parse(&["drawing.json"]);
        assert_eq!(config_from_cli(&cli).unwrap(), SolveConfig::default());
        assert_eq!(cli.runs, 1);
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&["d.json", "--strategy", "auto", "--exact-threshold", "4"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.strategy, MatchStrategy::Auto);
        assert_eq!(config.exact_threshold, 4);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "d.json",
            "--strategy",
            "greedy",
            "--config-json",
            r#"{"strategy":"Exact"}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.strategy, MatchStrategy::Exact);
        assert_eq!(config.exact_threshold, SolveConfig::DEFAULT_EXACT_THRESHOLD);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["d.json", "--config-json", "{not json"]);
        assert!(
            config_from_cli(&cli)
                .unwrap_err()
                .starts_with("Error parsing --config-json")
        );
    }

    #[test]
    fn zero_runs_is_rejected() {
        let result = Cli::try_parse_from(["plotwalk", "d.json", "--runs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn std_clock_measures_forward() {
        let start = StdClock.now();
        assert!(StdClock.elapsed(&start) >= Duration::ZERO);
    }
}
