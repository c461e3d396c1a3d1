//! JSON route export.
//!
//! A [`RouteDocument`] is everything a motion controller needs to replay
//! the route: the absolute points in walk order plus the relative moves
//! between them.

use serde::{Deserialize, Serialize};

use plotwalk_graph::{MatchStrategy, Move, Point, Route, relative_moves};

use crate::{ExportError, Result};

/// Serializable form of a solved route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDocument {
    /// Points in walk order; the first and last are equal.
    pub points: Vec<Point>,
    /// Total length of the walk.
    pub length: f64,
    /// Matching strategy that produced the route.
    pub strategy: MatchStrategy,
    /// Number of odd-vertex pairs joined by a retraced path.
    pub matched_pairs: usize,
    /// Displacement from each point to the next.
    pub moves: Vec<Move>,
}

impl RouteDocument {
    /// Resolve `route`'s vertex ids against the drawing's `points`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnknownVertex`] if the route visits a vertex
    /// that `points` does not contain.
    pub fn new(route: &Route, points: &[Point]) -> Result<Self> {
        let points = route
            .vertices
            .iter()
            .map(|&vertex| {
                points
                    .get(vertex)
                    .copied()
                    .ok_or(ExportError::UnknownVertex {
                        vertex,
                        point_count: points.len(),
                    })
            })
            .collect::<Result<Vec<Point>>>()?;
        let moves = relative_moves(&points);
        Ok(Self {
            points,
            length: route.length,
            strategy: route.strategy,
            matched_pairs: route.matched_pairs,
            moves,
        })
    }
}

/// Serialize a route to a pretty-printed JSON document.
///
/// # Errors
///
/// Returns [`ExportError::UnknownVertex`] if the route does not fit
/// `points`, or [`ExportError::Json`] if serialization fails.
pub fn to_route_json(route: &Route, points: &[Point]) -> Result<String> {
    let document = RouteDocument::new(route, points)?;
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn triangle_route() -> (Route, Vec<Point>) {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 4.0),
        ];
        let route = Route {
            vertices: vec![0, 1, 2, 0],
            length: 12.0,
            strategy: MatchStrategy::Greedy,
            matched_pairs: 0,
            matching_weight: 0.0,
        };
        (route, points)
    }

    #[test]
    fn document_lists_points_and_moves() {
        let (route, points) = triangle_route();
        let doc = RouteDocument::new(&route, &points).unwrap();
        assert_eq!(doc.points.len(), 4);
        assert_eq!(doc.points[3], Point::new(0.0, 0.0));
        assert_eq!(
            doc.moves,
            vec![
                Move { dx: 3.0, dy: 0.0 },
                Move { dx: 0.0, dy: 4.0 },
                Move { dx: -3.0, dy: -4.0 },
            ]
        );
    }

    #[test]
    fn unknown_vertex_is_an_error() {
        let (route, points) = triangle_route();
        let err = RouteDocument::new(&route, &points[..2]).unwrap_err();
        assert!(matches!(
            err,
            ExportError::UnknownVertex {
                vertex: 2,
                point_count: 2
            }
        ));
    }

    #[test]
    fn json_has_expected_fields() {
        let (route, points) = triangle_route();
        let json = to_route_json(&route, &points).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["points"].as_array().unwrap().len(), 4);
        assert_eq!(value["moves"].as_array().unwrap().len(), 3);
        assert_eq!(value["strategy"], "Greedy");
        assert!((value["length"].as_f64().unwrap() - 12.0).abs() < 1e-12);

        let back: RouteDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RouteDocument::new(&route, &points).unwrap());
    }
}
