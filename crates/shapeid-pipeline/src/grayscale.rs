//! Frame decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the
//! decoded frame plus single-channel views of it for the rest of the
//! pipeline.

use image::{DynamicImage, GrayImage};

use crate::types::{PipelineError, RgbaImage};

/// Decode raw frame bytes.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(image::load_from_memory(bytes)?)
}

/// Convert a decoded frame to RGBA, the format the staged result keeps
/// for display.
#[must_use = "returns the RGBA frame"]
pub fn to_rgba(image: &DynamicImage) -> RgbaImage {
    image.to_rgba8()
}

/// Convert a decoded frame to grayscale.
///
/// Uses the `image` crate's luminance weighting, so green contributes
/// most and blue least.
#[must_use = "returns the grayscale frame"]
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: encode a single 1x1 RGBA pixel as a PNG byte buffer.
    fn encode_rgba_pixel(r: u8, g: u8, b: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(1, 1, |_, _| image::Rgba([r, g, b, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .ok();
        buf
    }

    fn gray_of(r: u8, g: u8, b: u8) -> u8 {
        to_grayscale(&decode(&encode_rgba_pixel(r, g, b)).unwrap())
            .get_pixel(0, 0)
            .0[0]
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode(&[]), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn white_pixel_stays_white() {
        assert_eq!(gray_of(255, 255, 255), 255);
    }

    #[test]
    fn grayscale_weights_green_over_red_over_blue() {
        let (r, g, b) = (gray_of(255, 0, 0), gray_of(0, 255, 0), gray_of(0, 0, 255));
        assert!(
            g > r && r > b,
            "expected green > red > blue luminance, got R={r} G={g} B={b}",
        );
    }

    #[test]
    fn rgba_conversion_preserves_dimensions() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(17, 31));
        let rgba = to_rgba(&img);
        assert_eq!(rgba.dimensions(), (17, 31));
    }
}
