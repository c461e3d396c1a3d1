//! plotwalk-export: Pure format serializers (sans-IO)
//!
//! Converts solved routes into output formats: SVG for viewing and JSON
//! for motion control.

pub mod json;
pub mod svg;

pub use json::{RouteDocument, to_route_json};
pub use svg::{SvgMetadata, build_path_data, to_svg};

/// Errors that can occur while exporting a route.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The route visits a vertex that has no point.
    #[error("route visits vertex {vertex}, but only {point_count} points were given")]
    UnknownVertex {
        /// The vertex id with no matching point.
        vertex: usize,
        /// Number of points available.
        point_count: usize,
    },

    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for export operations.
pub type Result<T, E = ExportError> = std::result::Result<T, E>;
