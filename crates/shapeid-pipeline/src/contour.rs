//! Contour tracing: extract closed boundaries from a binary image.
//!
//! Uses Suzuki-Abe border following via
//! [`imageproc::contours::find_contours`] and keeps only external
//! boundaries: outer borders with no enclosing border. Holes, and any
//! shape drawn inside another shape's hole, are ignored.

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::types::{Contour, Point};

/// Trace the external contours of every foreground region.
///
/// Input: a binary image (non-zero pixels = foreground).
/// Output: one closed [`Contour`] per outermost region, in the order
/// the border follower encounters them (row-major by first pixel).
#[must_use = "returns the traced contours"]
pub fn trace_external(binary: &GrayImage) -> Vec<Contour> {
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(binary);

    contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            Contour::new(points)
        })
        .collect()
}
