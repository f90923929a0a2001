//! Inverse binary thresholding.
//!
//! Turns the blurred grayscale frame into the binary image contours are
//! traced from. Dark pixels (at or below the threshold) become
//! foreground (255) and bright pixels become background (0), so dark
//! shapes drawn on a light surface show up as filled regions.

use image::GrayImage;
use imageproc::contrast::ThresholdType;

/// Foreground value in the binary image.
pub const FOREGROUND: u8 = 255;

/// Apply an inverse binary threshold.
///
/// Pixels strictly brighter than `threshold` map to 0; everything else
/// maps to [`FOREGROUND`].
#[must_use = "returns the binary image"]
pub fn threshold_inverse(image: &GrayImage, threshold: u8) -> GrayImage {
    imageproc::contrast::threshold(image, threshold, ThresholdType::BinaryInverted)
}

/// Count foreground pixels in a binary image.
#[must_use]
pub fn foreground_pixel_count(image: &GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == FOREGROUND)))
        .sum()
}
