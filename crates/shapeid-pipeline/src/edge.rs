//! Canny edge detection.
//!
//! Wraps [`imageproc::edges::canny`]. The edge map is an inspection
//! output shown next to the threshold image; contours themselves are
//! traced from the threshold image.

use image::GrayImage;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero marks every pixel with any gradient as a
/// potential edge.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
///
/// Both thresholds are clamped to a minimum of [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to be at most `high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (low, high) = clamped_thresholds(low_threshold, high_threshold);
    imageproc::edges::canny(image, low, high)
}

/// Thresholds actually used by [`canny`] after clamping.
#[must_use]
pub fn clamped_thresholds(low_threshold: f32, high_threshold: f32) -> (f32, f32) {
    let high = high_threshold.max(MIN_THRESHOLD);
    (low_threshold.max(MIN_THRESHOLD).min(high), high)
}
