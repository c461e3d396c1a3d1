//! SVG export serializer.
//!
//! Renders a solved route as a single `<path>` element using the [`svg`]
//! crate for document construction, XML escaping, and path data
//! formatting. The route is one continuous pen stroke, so the path is one
//! `M` (move to) followed by `L` (line to) commands.
//!
//! The `viewBox` is the bounding box of the route plus a margin, so the
//! drawing keeps its own coordinate system.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use plotwalk_graph::Point;

/// Margin around the drawing, as a fraction of its larger extent.
const MARGIN_FRACTION: f64 = 0.025;

/// Margin used when every point coincides.
const MIN_MARGIN: f64 = 1.0;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically by
/// the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the drawing's file name without extension.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized solve configuration, emitted inside `<metadata>` in a
    /// namespaced `<plotwalk:config>` element so exported files record
    /// how they were produced.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a point sequence.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for fewer than 2 points.
///
/// # Examples
///
/// ```
/// use plotwalk_graph::Point;
/// use plotwalk_export::build_path_data;
///
/// let d = build_path_data(&[Point::new(10.0, 20.0), Point::new(30.0, 40.0)]);
/// assert_eq!(d, "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(points: &[Point]) -> String {
    let [first, rest @ ..] = points else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data))
}

/// Axis-aligned bounding box `(min_x, min_y, max_x, max_y)` of `points`.
fn bounding_box(points: &[Point]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    Some(points.iter().fold(
        (first.x, first.y, first.x, first.y),
        |(min_x, min_y, max_x, max_y), p| {
            (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
        },
    ))
}

/// The `viewBox` attribute value for `points`.
fn view_box(points: &[Point]) -> String {
    let Some((min_x, min_y, max_x, max_y)) = bounding_box(points) else {
        return "0 0 1 1".to_owned();
    };
    let extent = (max_x - min_x).max(max_y - min_y);
    let margin = if extent > 0.0 {
        extent * MARGIN_FRACTION
    } else {
        MIN_MARGIN
    };
    format!(
        "{} {} {} {}",
        min_x - margin,
        min_y - margin,
        2.0f64.mul_add(margin, max_x - min_x),
        2.0f64.mul_add(margin, max_y - min_y),
    )
}

/// Serialize a route (as its ordered points) to an SVG document string.
///
/// Produces a complete SVG document with:
/// - XML declaration
/// - `viewBox` fitted to the route's bounding box plus a margin
/// - Optional `<title>`, `<desc>` and `<metadata>` from `metadata`
/// - One `<path>` element holding the whole route, omitted when the
///   route has fewer than 2 points
///
/// The stroke does not scale with the `viewBox`, so it renders at the
/// same width whatever the drawing's units.
#[must_use]
pub fn to_svg(points: &[Point], metadata: &SvgMetadata<'_>) -> String {
    let mut doc = Document::new().set("viewBox", view_box(points));

    // Optional <title> element
    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    // Optional <desc> element
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    // Optional <metadata> element with the solve configuration
    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("plotwalk:config");
        config_el.assign("xmlns:plotwalk", "https://plotwalk.dev/ns/1");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    let d = build_path_data(points);
    if !d.is_empty() {
        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", "black")
            .set("stroke-width", 1)
            .set("stroke-linejoin", "round")
            .set("vector-effect", "non-scaling-stroke");
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    // --- build_path_data ---

    #[test]
    fn build_path_data_empty() {
        assert_eq!(build_path_data(&[]), "");
    }

    #[test]
    fn build_path_data_single_point() {
        assert_eq!(build_path_data(&[Point::new(5.0, 5.0)]), "");
    }

    #[test]
    fn build_path_data_closed_route() {
        let d = build_path_data(&[
            Point::new(0.0, 0.0),
            Point::new(12.5, 0.0),
            Point::new(0.0, 7.5),
            Point::new(0.0, 0.0),
        ]);
        assert_eq!(d, "M0,0 L12.5,0 L0,7.5 L0,0");
    }

    // --- viewBox ---

    #[test]
    fn view_box_adds_margin() {
        let points = [Point::new(0.0, 0.0), Point::new(40.0, 20.0)];
        assert_eq!(view_box(&points), "-1 -1 42 22");
    }

    #[test]
    fn view_box_of_a_single_point() {
        assert_eq!(view_box(&[Point::new(3.0, 4.0)]), "2 3 2 2");
    }

    #[test]
    fn view_box_of_nothing() {
        assert_eq!(view_box(&[]), "0 0 1 1");
    }

    // --- Documents ---

    #[test]
    fn empty_route_produces_valid_svg_with_no_path() {
        let svg = to_svg(&[], &no_meta());
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"viewBox="0 0 1 1""#));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn route_becomes_one_path() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(40.0, 0.0),
            Point::new(40.0, 20.0),
            Point::new(0.0, 0.0),
        ];
        let svg = to_svg(&points, &no_meta());
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains(r#"d="M0,0 L40,0 L40,20 L0,0""#));
        assert!(svg.contains(r#"fill="none""#));
        assert!(svg.contains(r#"vector-effect="non-scaling-stroke""#));
    }

    // --- Metadata ---

    #[test]
    fn metadata_is_embedded_and_escaped() {
        let meta = SvgMetadata {
            title: Some("house & garden"),
            description: Some("strategy=<exact>"),
            config_json: Some(r#"{"strategy":"Exact"}"#),
        };
        let svg = to_svg(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], &meta);
        assert!(svg.contains("<title>house &amp; garden</title>"));
        assert!(svg.contains("<desc>strategy=&lt;exact&gt;</desc>"));
        assert!(svg.contains("<metadata>"));
        assert!(svg.contains(r#"xmlns:plotwalk="https://plotwalk.dev/ns/1""#));
    }

    #[test]
    fn metadata_comes_before_the_path() {
        let meta = SvgMetadata {
            title: Some("t"),
            description: Some("d"),
            config_json: Some("{}"),
        };
        let svg = to_svg(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], &meta);
        let title = svg.find("<title>");
        let desc = svg.find("<desc>");
        let metadata = svg.find("<metadata>");
        let path = svg.find("<path");
        assert!(title < desc && desc < metadata && metadata < path);
        assert!(path.is_some());
    }

    #[test]
    fn no_metadata_elements_by_default() {
        let svg = to_svg(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], &no_meta());
        assert!(!svg.contains("<title"));
        assert!(!svg.contains("<desc"));
        assert!(!svg.contains("<metadata"));
    }
}
