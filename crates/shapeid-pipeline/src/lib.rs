//! shapeid-pipeline: Frame processing and shape classification (sans-IO).
//!
//! Turns a video frame into labelled shape detections through:
//! resize -> grayscale -> blur -> inverse threshold -> external contour
//! tracing -> area filter -> polygon approximation -> vertex-count and
//! aspect-ratio classification.
//!
//! A Canny edge map of the blurred frame is also produced by the staged
//! entry points for inspection. It does not feed the classifier.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and decoded images and returns structured data. All
//! filesystem interaction lives in the `shapeid` binary.

pub mod blur;
pub mod classify;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod filter;
pub mod grayscale;
pub mod resize;
pub mod simplify;
pub mod threshold;
pub mod types;

use image::{DynamicImage, GrayImage};

pub use classify::{Classification, DetectionTally, classify, detect_shapes, detect_shapes_tallied};
pub use diagnostics::{Clock, FrameDiagnostics, process_staged_with_diagnostics};
pub use filter::ContourFilter;
pub use resize::ResizeFilter;
pub use types::{
    BoundingBox, ClassifierConfig, Contour, Detection, Dimensions, FrameResult, PipelineConfig,
    PipelineError, Point, ShapeLabel, StagedFrame,
};

/// Detect and label the shapes in one encoded frame.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces a [`FrameResult`] holding the detections in contour
/// order together with the processed frame dimensions.
///
/// # Pipeline steps
///
/// 1. Decode
/// 2. Resize to `config.frame_size` (unless `None`)
/// 3. Grayscale conversion
/// 4. Gaussian blur
/// 5. Inverse binary threshold (dark shapes become foreground)
/// 6. External contour tracing
/// 7. Area filter, polygon approximation, classification
///
/// A frame without any shapes is not an error: the result simply has no
/// detections.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
pub fn process(image_bytes: &[u8], config: &PipelineConfig) -> Result<FrameResult, PipelineError> {
    config.validate()?;
    let decoded = grayscale::decode(image_bytes)?;
    Ok(Traced::run(&decoded, config).into_result())
}

/// Detect and label the shapes in an already decoded frame.
///
/// Same as [`process`] minus the decode step, for callers that obtain
/// frames from a capture source rather than encoded files.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
pub fn process_image(
    frame: &DynamicImage,
    config: &PipelineConfig,
) -> Result<FrameResult, PipelineError> {
    config.validate()?;
    Ok(Traced::run(frame, config).into_result())
}

/// Run the pipeline and keep every intermediate raster.
///
/// Unlike [`process`] this also computes the Canny edge map, so the
/// caller can display threshold, edges, and outlines side by side.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<StagedFrame, PipelineError> {
    config.validate()?;
    let decoded = grayscale::decode(image_bytes)?;
    let traced = Traced::run(&decoded, config);
    let edges = edge::canny(&traced.blurred, config.canny_low, config.canny_high);

    Ok(StagedFrame {
        frame: grayscale::to_rgba(&traced.resized),
        grayscale: traced.gray,
        blurred: traced.blurred,
        threshold: traced.binary,
        edges,
        contours: traced.contours,
        detections: traced.detections,
        dimensions: traced.dimensions,
    })
}

/// Everything stages 2 through 7 produce for one decoded frame.
struct Traced {
    resized: DynamicImage,
    gray: GrayImage,
    blurred: GrayImage,
    binary: GrayImage,
    contours: Vec<Contour>,
    detections: Vec<Detection>,
    dimensions: Dimensions,
}

impl Traced {
    /// `config` is already validated.
    fn run(frame: &DynamicImage, config: &PipelineConfig) -> Self {
        let (resized, _) = resize::resize_frame(frame, config.frame_size, config.resize_filter);
        let gray = grayscale::to_grayscale(&resized);
        let dimensions = Dimensions {
            width: gray.width(),
            height: gray.height(),
        };
        let blurred = blur::gaussian_blur(&gray, config.blur_sigma);
        let binary = threshold::threshold_inverse(&blurred, config.threshold);
        let contours = contour::trace_external(&binary);
        let detections = detect_shapes(&contours, &config.classifier);

        tracing::debug!(
            width = dimensions.width,
            height = dimensions.height,
            contours = contours.len(),
            shapes = detections.len(),
            "processed frame",
        );

        Self {
            resized,
            gray,
            blurred,
            binary,
            contours,
            detections,
            dimensions,
        }
    }

    fn into_result(self) -> FrameResult {
        FrameResult {
            detections: self.detections,
            dimensions: self.dimensions,
        }
    }
}
