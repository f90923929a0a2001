//! Frame diagnostics: timing and counts for each processing stage.
//!
//! [`process_staged_with_diagnostics`] runs the same stages as
//! [`process_staged`](crate::process_staged) and records, for every
//! stage, how long it took and what it produced. Intended for tuning
//! thresholds and the classifier policy against real footage.
//!
//! Time is read through the [`Clock`] trait so this crate stays free of
//! platform time sources; the CLI supplies a `std::time::Instant` clock.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{DetectionTally, detect_shapes_tallied};
use crate::types::{Contour, Dimensions, PipelineConfig, PipelineError, ShapeLabel, StagedFrame};

/// Source of monotonic time for stage measurements.
pub trait Clock {
    /// A point in time.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from processing a single frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Resize to the working frame size.
    pub resize: StageDiagnostics,
    /// Grayscale conversion.
    pub grayscale: StageDiagnostics,
    /// Gaussian blur.
    pub blur: StageDiagnostics,
    /// Inverse binary threshold.
    pub threshold: StageDiagnostics,
    /// Canny edge detection.
    pub edge_detection: StageDiagnostics,
    /// External contour tracing.
    pub contour_tracing: StageDiagnostics,
    /// Area filter plus classification.
    pub classification: StageDiagnostics,
    /// Total wall-clock duration of the frame (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: FrameSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded width in pixels.
        width: u32,
        /// Decoded height in pixels.
        height: u32,
    },
    /// Resize metrics.
    Resize {
        /// Whether the frame had to be resized.
        applied: bool,
        /// Resampling filter name.
        filter: String,
        /// Width after resizing.
        width: u32,
        /// Height after resizing.
        height: u32,
    },
    /// Grayscale conversion metrics.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Gaussian blur metrics.
    Blur {
        /// Sigma used for the blur kernel.
        sigma: f32,
    },
    /// Threshold metrics.
    Threshold {
        /// Threshold value.
        threshold: u8,
        /// Number of foreground pixels.
        foreground_pixel_count: u64,
        /// Total pixel count, for foreground density.
        total_pixel_count: u64,
    },
    /// Canny edge detection metrics.
    EdgeDetection {
        /// Low threshold (after clamping).
        low_threshold: f32,
        /// High threshold (after clamping).
        high_threshold: f32,
        /// Number of edge pixels in the output.
        edge_pixel_count: u64,
        /// Total pixel count, for edge density.
        total_pixel_count: u64,
    },
    /// Contour tracing metrics.
    ContourTracing {
        /// Number of external contours found.
        contour_count: usize,
        /// Total number of points across all contours.
        total_point_count: usize,
        /// Minimum points in any single contour.
        min_contour_points: usize,
        /// Maximum points in any single contour.
        max_contour_points: usize,
        /// Mean points per contour.
        mean_contour_points: f64,
    },
    /// Filter and classification metrics.
    Classification {
        /// What happened to the traced contours.
        tally: DetectionTally,
        /// Detections per label. Labels with no detection are omitted.
        labels: BTreeMap<ShapeLabel, usize>,
    },
}

/// High-level summary counts for the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Processed frame width in pixels.
    pub frame_width: u32,
    /// Processed frame height in pixels.
    pub frame_height: u32,
    /// Number of contours traced.
    pub contour_count: usize,
    /// Number of labelled shapes.
    pub detection_count: usize,
}

/// Run the frame pipeline, measuring every stage.
///
/// # Errors
///
/// Same as [`process_staged`](crate::process_staged).
pub fn process_staged_with_diagnostics<C: Clock>(
    bytes: &[u8],
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedFrame, FrameDiagnostics), PipelineError> {
    config.validate()?;
    let start = clock.now();

    let t = clock.now();
    let decoded = crate::grayscale::decode(bytes)?;
    let decode = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Decode {
            input_bytes: bytes.len(),
            width: decoded.width(),
            height: decoded.height(),
        },
    };

    let t = clock.now();
    let (resized, applied) =
        crate::resize::resize_frame(&decoded, config.frame_size, config.resize_filter);
    let frame = crate::grayscale::to_rgba(&resized);
    let dimensions = Dimensions {
        width: frame.width(),
        height: frame.height(),
    };
    let resize = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Resize {
            applied,
            filter: config.resize_filter.to_string(),
            width: dimensions.width,
            height: dimensions.height,
        },
    };

    let t = clock.now();
    let grayscale_image = crate::grayscale::to_grayscale(&resized);
    let grayscale = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Grayscale {
            width: dimensions.width,
            height: dimensions.height,
        },
    };

    let t = clock.now();
    let blurred = crate::blur::gaussian_blur(&grayscale_image, config.blur_sigma);
    let blur = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Blur {
            sigma: config.blur_sigma,
        },
    };

    let total_pixel_count = u64::from(dimensions.width) * u64::from(dimensions.height);

    let t = clock.now();
    let binary = crate::threshold::threshold_inverse(&blurred, config.threshold);
    let threshold = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Threshold {
            threshold: config.threshold,
            foreground_pixel_count: crate::threshold::foreground_pixel_count(&binary),
            total_pixel_count,
        },
    };

    let t = clock.now();
    let edges = crate::edge::canny(&blurred, config.canny_low, config.canny_high);
    let (low_threshold, high_threshold) =
        crate::edge::clamped_thresholds(config.canny_low, config.canny_high);
    let edge_detection = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count: count_edge_pixels(&edges),
            total_pixel_count,
        },
    };

    let t = clock.now();
    let contours = crate::contour::trace_external(&binary);
    let stats = contour_stats(&contours);
    let contour_tracing = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::ContourTracing {
            contour_count: contours.len(),
            total_point_count: stats.total,
            min_contour_points: stats.min,
            max_contour_points: stats.max,
            mean_contour_points: stats.mean,
        },
    };

    let t = clock.now();
    let (detections, tally) = detect_shapes_tallied(&contours, &config.classifier);
    let mut labels = BTreeMap::new();
    for detection in &detections {
        *labels.entry(detection.label).or_insert(0) += 1;
    }
    let classification = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Classification { tally, labels },
    };

    let summary = FrameSummary {
        frame_width: dimensions.width,
        frame_height: dimensions.height,
        contour_count: contours.len(),
        detection_count: detections.len(),
    };

    let diagnostics = FrameDiagnostics {
        decode,
        resize,
        grayscale,
        blur,
        threshold,
        edge_detection,
        contour_tracing,
        classification,
        total_duration: clock.elapsed(&start),
        summary,
    };

    let staged = StagedFrame {
        frame,
        grayscale: grayscale_image,
        blurred,
        threshold: binary,
        edges,
        contours,
        detections,
        dimensions,
    };

    Ok((staged, diagnostics))
}

impl FrameDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Frame Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Frame: {}x{}",
            self.summary.frame_width, self.summary.frame_height,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let stages = [
            ("Decode", &self.decode),
            ("Resize", &self.resize),
            ("Grayscale", &self.grayscale),
            ("Blur", &self.blur),
            ("Threshold", &self.threshold),
            ("Edge Detection", &self.edge_detection),
            ("Contour Tracing", &self.contour_tracing),
            ("Classification", &self.classification),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Shapes: {}",
            self.summary.contour_count, self.summary.detection_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Resize {
            applied,
            filter,
            width,
            height,
        } => {
            if *applied {
                format!("{filter} -> {width}x{height}")
            } else {
                format!("unchanged {width}x{height}")
            }
        }
        StageMetrics::Grayscale { width, height } => format!("{width}x{height}"),
        StageMetrics::Blur { sigma } => format!("sigma={sigma:.2}"),
        StageMetrics::Threshold {
            threshold,
            foreground_pixel_count,
            total_pixel_count,
        } => format!(
            "t={threshold} foreground={foreground_pixel_count} ({:.1}%)",
            percent(*foreground_pixel_count, *total_pixel_count),
        ),
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count,
            total_pixel_count,
        } => format!(
            "low={low_threshold:.1} high={high_threshold:.1} edges={edge_pixel_count} ({:.1}%)",
            percent(*edge_pixel_count, *total_pixel_count),
        ),
        StageMetrics::ContourTracing {
            contour_count,
            total_point_count,
            min_contour_points,
            max_contour_points,
            mean_contour_points,
        } => format!(
            "{contour_count} contours, {total_point_count} pts (min={min_contour_points} max={max_contour_points} mean={mean_contour_points:.1})",
        ),
        StageMetrics::Classification { tally, labels } => {
            let counts: Vec<String> = labels
                .iter()
                .map(|(label, n)| format!("{label}={n}"))
                .collect();
            format!(
                "{} rejected, {} unlabelled, {} shapes [{}]",
                tally.rejected,
                tally.unclassified,
                tally.detected,
                counts.join(" "),
            )
        }
    }
}

/// Count edge pixels (value == 255) in a grayscale image.
pub(crate) fn count_edge_pixels(image: &image::GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}

/// Statistics for a set of contours.
pub(crate) struct ContourStats {
    /// Total number of points across all contours.
    pub total: usize,
    /// Minimum number of points in any single contour.
    pub min: usize,
    /// Maximum number of points in any single contour.
    pub max: usize,
    /// Mean number of points per contour.
    pub mean: f64,
}

/// Compute point-count statistics for a set of contours.
pub(crate) fn contour_stats(contours: &[Contour]) -> ContourStats {
    let total: usize = contours.iter().map(Contour::len).sum();
    let min = contours.iter().map(Contour::len).min().unwrap_or(0);
    let max = contours.iter().map(Contour::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if contours.is_empty() {
        0.0
    } else {
        total as f64 / contours.len() as f64
    };
    ContourStats {
        total,
        min,
        max,
        mean,
    }
}
