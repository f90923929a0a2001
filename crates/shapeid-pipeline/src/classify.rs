//! Shape classification by vertex count and aspect ratio.
//!
//! A contour is approximated with a tolerance proportional to its
//! perimeter, which makes the vertex count independent of the shape's
//! size. The count then maps to a label:
//!
//! | vertices | label |
//! |---|---|
//! | 3 | Triangle |
//! | 4, aspect ratio inside the square band | Square |
//! | 4, otherwise | Rectangle |
//! | more than `polygon_max_vertices` | Circle |
//! | anything else | Polygon |
//!
//! The aspect ratio is the original contour's bounding-box width over
//! its height, both counted in whole pixels. A box without height gets
//! no label at all.

use serde::{Deserialize, Serialize};

use crate::filter::ContourFilter;
use crate::simplify::approximate_polygon;
use crate::types::{BoundingBox, ClassifierConfig, Contour, Detection, ShapeLabel};

/// Vertex count of a triangle.
pub const TRIANGLE_VERTICES: usize = 3;
/// Vertex count of a quadrilateral.
pub const QUADRILATERAL_VERTICES: usize = 4;

/// Outcome of classifying a single contour.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The assigned label.
    pub label: ShapeLabel,
    /// Polygon approximation the label was derived from.
    pub outline: Contour,
    /// Bounding box of the original contour.
    pub bounding_box: BoundingBox,
}

impl Classification {
    /// Turn the classification into a detection anchored at the
    /// bounding box's top-left corner.
    #[must_use]
    pub fn into_detection(self) -> Detection {
        Detection {
            label: self.label,
            anchor: self.bounding_box.top_left(),
            outline: self.outline,
            bounding_box: self.bounding_box,
        }
    }
}

/// Classify one contour.
///
/// This does not apply the area filter; see [`detect_shapes`] for the
/// filtered path.
///
/// Returns `None` when the contour cannot be labelled: fewer than 3
/// points, a bounding box without height, or an approximation that
/// collapses below 3 vertices.
#[must_use]
pub fn classify(contour: &Contour, config: &ClassifierConfig) -> Option<Classification> {
    if contour.len() < TRIANGLE_VERTICES {
        return None;
    }

    let bounding_box = contour.bounding_box()?;
    let aspect_ratio = bounding_box.aspect_ratio()?;

    let tolerance = config.epsilon_factor * contour.perimeter();
    let outline = approximate_polygon(contour, tolerance);
    let label = label_for(outline.len(), aspect_ratio, config)?;

    Some(Classification {
        label,
        outline,
        bounding_box,
    })
}

/// The decision table: map a vertex count and aspect ratio to a label.
///
/// Returns `None` for fewer than 3 vertices. Bounds of the square band
/// are inclusive.
#[must_use]
pub fn label_for(vertices: usize, aspect_ratio: f64, config: &ClassifierConfig) -> Option<ShapeLabel> {
    let label = match vertices {
        v if v < TRIANGLE_VERTICES => return None,
        TRIANGLE_VERTICES => ShapeLabel::Triangle,
        QUADRILATERAL_VERTICES => {
            if (config.square_aspect_min..=config.square_aspect_max).contains(&aspect_ratio) {
                ShapeLabel::Square
            } else {
                ShapeLabel::Rectangle
            }
        }
        v if v > config.polygon_max_vertices => ShapeLabel::Circle,
        _ => ShapeLabel::Polygon,
    };
    Some(label)
}

/// Per-frame counts of what happened to each traced contour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionTally {
    /// Contours considered.
    pub contours: usize,
    /// Contours discarded by the area filter.
    pub rejected: usize,
    /// Contours that passed the filter but could not be labelled.
    pub unclassified: usize,
    /// Contours labelled.
    pub detected: usize,
}

/// Filter and classify every contour of a frame.
///
/// Detections keep the order of `contours`.
#[must_use]
pub fn detect_shapes(contours: &[Contour], config: &ClassifierConfig) -> Vec<Detection> {
    detect_shapes_tallied(contours, config).0
}

/// Like [`detect_shapes`], also reporting how many contours were
/// rejected or left unlabelled.
#[must_use]
pub fn detect_shapes_tallied(
    contours: &[Contour],
    config: &ClassifierConfig,
) -> (Vec<Detection>, DetectionTally) {
    let filter = ContourFilter::from_config(config);
    let mut tally = DetectionTally {
        contours: contours.len(),
        ..DetectionTally::default()
    };

    let detections: Vec<Detection> = contours
        .iter()
        .filter_map(|contour| {
            if !filter.accepts(contour) {
                tally.rejected += 1;
                return None;
            }
            let classification = classify(contour, config);
            if classification.is_none() {
                tracing::trace!(points = contour.len(), "contour passed filter but has no label");
                tally.unclassified += 1;
            }
            classification.map(Classification::into_detection)
        })
        .collect();

    tally.detected = detections.len();
    (detections, tally)
}
