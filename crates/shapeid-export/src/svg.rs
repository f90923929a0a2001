//! SVG export serializer.
//!
//! Renders the detections of one frame as an overlay: every outline
//! becomes a closed `<path>` and every label a `<text>` element placed
//! just above the detection's anchor. Coordinates stay in frame pixels,
//! so the overlay lines up with the frame when both are drawn at the
//! same size.
//!
//! Document construction, XML escaping, and path data formatting are
//! delegated to the [`svg`] crate. This is a pure function with no I/O
//! -- it returns a `String`.

use svg::Document;
use svg::node::Value;
use svg::node::element::path::Data;
use svg::node::element::{Description, Path, Text as TextElement, Title};
use svg::node::Text;

use shapeid_pipeline::{Contour, Detection, Dimensions};

/// Outline stroke colour.
pub const OUTLINE_COLOR: &str = "#0000ff";
/// Outline stroke width in pixels.
pub const OUTLINE_WIDTH: u32 = 2;
/// Label text colour.
pub const LABEL_COLOR: &str = "#00ff00";
/// Label font size in pixels.
pub const LABEL_FONT_SIZE: u32 = 12;
/// Vertical distance between a detection's anchor and its label baseline.
pub const LABEL_OFFSET: f64 = 10.0;

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the frame's file name.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically a summary of the detections or the pipeline settings.
    pub description: Option<&'a str>,
}

/// Build an SVG path `d` attribute string for a closed outline.
///
/// Uses `M` for the first point, `L` for each following point, and
/// closes the ring back to the start. Returns an empty string for
/// outlines with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use shapeid_pipeline::{Contour, Point};
/// use shapeid_export::build_path_data;
///
/// let outline = Contour::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
///     Point::new(10.0, 40.0),
/// ]);
/// let d = build_path_data(&outline);
/// assert!(d.starts_with("M10,20 L30,40 L10,40"));
/// ```
#[must_use]
pub fn build_path_data(outline: &Contour) -> String {
    let points = outline.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data.close()))
}

/// Serialize the detections of one frame into an SVG overlay.
///
/// The document is `dimensions.width` by `dimensions.height` pixels with
/// a matching `viewBox`. Detections are emitted in the order given, each
/// as a path followed by its label. Outlines with fewer than 2 points
/// get a label but no path.
#[must_use]
pub fn to_svg(
    detections: &[Detection],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    for detection in detections {
        let d = build_path_data(&detection.outline);
        if !d.is_empty() {
            let path = Path::new()
                .set("d", d)
                .set("fill", "none")
                .set("stroke", OUTLINE_COLOR)
                .set("stroke-width", OUTLINE_WIDTH);
            doc = doc.add(path);
        }

        let label = TextElement::new(detection.label.as_str())
            .set("x", detection.anchor.x)
            .set("y", detection.anchor.y - LABEL_OFFSET)
            .set("font-size", LABEL_FONT_SIZE)
            .set("fill", LABEL_COLOR);
        doc = doc.add(label);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
