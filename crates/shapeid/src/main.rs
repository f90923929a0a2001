//! shapeid: label the geometric shapes in a sequence of video frames.
//!
//! Every frame is run through the shape pipeline: area filter, polygon
//! approximation, then classification by vertex count and aspect ratio.
//! Per-frame results can be printed as JSON lines, written as annotated
//! SVG overlays, or reported with per-stage diagnostics. After the last
//! frame an optional inspection panel shows how that frame was seen.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin shapeid -- [OPTIONS] <FRAMES>...
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod error;
mod frames;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use shapeid_pipeline::diagnostics::Clock;
use shapeid_pipeline::{
    ClassifierConfig, Detection, Dimensions, PipelineConfig, ResizeFilter, StagedFrame,
};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Label the geometric shapes in a sequence of video frames.
///
/// Dark shapes on a light background are traced, filtered by area,
/// approximated by polygons, and labelled Triangle, Square, Rectangle,
/// Polygon, or Circle.
#[derive(Parser)]
#[command(name = "shapeid", version)]
struct Cli {
    /// Frame images (PNG, JPEG, BMP, WebP) or directories of them.
    ///
    /// Directory entries are processed in file-name order.
    #[arg(required = true, value_name = "FRAMES")]
    frames: Vec<PathBuf>,

    /// Inverse binary threshold: pixels brighter than this are background.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Gaussian blur sigma.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BLUR_SIGMA)]
    blur_sigma: f32,

    /// Canny low threshold (inspection edge map).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CANNY_LOW)]
    canny_low: f32,

    /// Canny high threshold (inspection edge map).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CANNY_HIGH)]
    canny_high: f32,

    /// Contours enclosing this many square pixels or fewer are ignored.
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_MIN_AREA)]
    min_area: f64,

    /// Polygon approximation tolerance as a fraction of the perimeter.
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_EPSILON_FACTOR)]
    epsilon_factor: f64,

    /// Width every frame is resized to.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_FRAME_SIZE.width, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    frame_width: u32,

    /// Height every frame is resized to.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_FRAME_SIZE.height, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    frame_height: u32,

    /// Process frames at their native resolution instead of resizing.
    #[arg(long)]
    native_size: bool,

    /// Resize filter (nearest, triangle, catmull-rom, gaussian, lanczos3).
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_FILTER)]
    resize_filter: Filter,

    /// Full pipeline config as a JSON file.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// Fields missing from the file take their default values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print one JSON line per frame instead of a human-readable summary.
    #[arg(long)]
    json: bool,

    /// Write an annotated SVG overlay per frame into this directory.
    #[arg(long, value_name = "DIR")]
    svg_dir: Option<PathBuf>,

    /// Print per-stage timing and count diagnostics for every frame.
    #[arg(long)]
    diagnostics: bool,

    /// Save a threshold | edges | detections panel of the last frame.
    #[arg(long, value_name = "FILE")]
    panel: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Resize filter selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

/// Maps a [`ResizeFilter`] to the local CLI [`Filter`] enum.
const fn filter_from_pipeline(f: ResizeFilter) -> Filter {
    match f {
        ResizeFilter::Nearest => Filter::Nearest,
        ResizeFilter::Triangle => Filter::Triangle,
        ResizeFilter::CatmullRom => Filter::CatmullRom,
        ResizeFilter::Gaussian => Filter::Gaussian,
        ResizeFilter::Lanczos3 => Filter::Lanczos3,
    }
}

/// The CLI default filter, derived from [`PipelineConfig::DEFAULT_RESIZE_FILTER`]
/// so the two cannot silently diverge.
const CLI_DEFAULT_FILTER: Filter = filter_from_pipeline(PipelineConfig::DEFAULT_RESIZE_FILTER);

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config` is provided, the file is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags. Either way the result is
/// validated.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, CliError> {
    let config = if let Some(ref path) = cli.config {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| CliError::ConfigParse {
            path: path.clone(),
            source,
        })?
    } else {
        PipelineConfig {
            frame_size: (!cli.native_size).then_some(Dimensions {
                width: cli.frame_width,
                height: cli.frame_height,
            }),
            resize_filter: match cli.resize_filter {
                Filter::Nearest => ResizeFilter::Nearest,
                Filter::Triangle => ResizeFilter::Triangle,
                Filter::CatmullRom => ResizeFilter::CatmullRom,
                Filter::Gaussian => ResizeFilter::Gaussian,
                Filter::Lanczos3 => ResizeFilter::Lanczos3,
            },
            blur_sigma: cli.blur_sigma,
            threshold: cli.threshold,
            canny_low: cli.canny_low,
            canny_high: cli.canny_high,
            classifier: ClassifierConfig {
                min_area: cli.min_area,
                epsilon_factor: cli.epsilon_factor,
                ..ClassifierConfig::default()
            },
        }
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;
    tracing::debug!(?config, "pipeline configuration");

    let frames = frames::collect_frames(&cli.frames)?;
    if let Some(ref dir) = cli.svg_dir {
        std::fs::create_dir_all(dir).map_err(|source| CliError::Write {
            path: dir.clone(),
            source,
        })?;
    }

    let outputs = Outputs {
        json: cli.json,
        svg_dir: cli.svg_dir.as_deref(),
        diagnostics: cli.diagnostics,
    };
    let last = process_frames(&frames, &config, &outputs)?;
    let Some(last) = last else {
        return Err(CliError::NoFrames);
    };

    if let Some(ref path) = cli.panel {
        render::panel(&last.staged)
            .save(path)
            .map_err(|source| CliError::SavePanel {
                path: path.clone(),
                source,
            })?;
        tracing::info!(
            panel = %path.display(),
            frame = %last.path.display(),
            "saved panel of last frame",
        );
    }

    Ok(())
}

/// Where per-frame results go.
struct Outputs<'a> {
    json: bool,
    svg_dir: Option<&'a Path>,
    diagnostics: bool,
}

/// The most recent successfully processed frame.
struct LastFrame {
    path: PathBuf,
    staged: StagedFrame,
}

/// One line of `--json` output.
#[derive(Serialize)]
struct FrameReport<'a> {
    index: usize,
    frame: String,
    dimensions: Dimensions,
    detections: &'a [Detection],
}

/// Run every frame through the pipeline in order.
///
/// Frames that cannot be read or decoded are logged and skipped. Returns
/// the last frame that was processed, or `None` if none was.
fn process_frames(
    frames: &[PathBuf],
    config: &PipelineConfig,
    outputs: &Outputs<'_>,
) -> Result<Option<LastFrame>, CliError> {
    let mut last = None;
    let mut processed = 0_usize;

    for (index, path) in frames.iter().enumerate() {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(frame = %path.display(), "skipping unreadable frame: {e}");
                continue;
            }
        };

        let staged = if outputs.diagnostics {
            shapeid_pipeline::process_staged_with_diagnostics(&bytes, config, &StdClock).map(
                |(staged, diagnostics)| {
                    println!("{}\n{}\n", path.display(), diagnostics.report());
                    staged
                },
            )
        } else {
            shapeid_pipeline::process_staged(&bytes, config)
        };
        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!(frame = %path.display(), "skipping frame: {e}");
                continue;
            }
        };

        tracing::info!(
            frame = %path.display(),
            contours = staged.contours.len(),
            shapes = staged.detections.len(),
            "processed frame",
        );

        if outputs.json {
            let report = FrameReport {
                index,
                frame: path.display().to_string(),
                dimensions: staged.dimensions,
                detections: &staged.detections,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", summary_line(path, &staged.detections));
        }

        if let Some(dir) = outputs.svg_dir {
            write_svg(dir, index, path, &staged)?;
        }

        processed += 1;
        last = Some(LastFrame {
            path: path.clone(),
            staged,
        });
    }

    tracing::debug!(processed, total = frames.len(), "frame loop finished");
    Ok(last)
}

/// `path: Square@(40,40) Circle@(460,270)`.
fn summary_line(path: &Path, detections: &[Detection]) -> String {
    let shapes: Vec<String> = detections
        .iter()
        .map(|d| format!("{}@({:.0},{:.0})", d.label, d.anchor.x, d.anchor.y))
        .collect();
    if shapes.is_empty() {
        format!("{}: no shapes", path.display())
    } else {
        format!("{}: {}", path.display(), shapes.join(" "))
    }
}

/// Write the overlay for frame `index` as `<index>-<stem>.svg`.
///
/// The index keeps frames with the same file stem from overwriting each
/// other's overlays.
fn write_svg(
    dir: &Path,
    index: usize,
    frame: &Path,
    staged: &StagedFrame,
) -> Result<(), CliError> {
    let title = frame
        .file_stem()
        .map_or_else(|| "frame".into(), |s| s.to_string_lossy());
    let description = format!("{} shapes", staged.detections.len());
    let metadata = shapeid_export::SvgMetadata {
        title: Some(&*title),
        description: Some(&description),
    };
    let svg = shapeid_export::to_svg(&staged.detections, staged.dimensions, &metadata);

    let svg_path = dir.join(svg_file_name(index, &title));
    std::fs::write(&svg_path, &svg).map_err(|source| CliError::Write {
        path: svg_path.clone(),
        source,
    })?;
    tracing::debug!(svg = %svg_path.display(), bytes = svg.len(), "wrote overlay");
    Ok(())
}

fn svg_file_name(index: usize, stem: &str) -> String {
    format!("{index:05}-{stem}.svg")
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{Rgba, RgbaImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;
    use shapeid_pipeline::{Contour, Point, ShapeLabel};

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shapeid").chain(args.iter().copied())).unwrap()
    }

    fn write_frame(path: &Path, shape: Option<Rect>) {
        let mut img = RgbaImage::from_pixel(320, 240, Rgba([255, 255, 255, 255]));
        if let Some(rect) = shape {
            draw_filled_rect_mut(&mut img, rect, Rgba([0, 0, 0, 255]));
        }
        img.save(path).unwrap();
    }

    fn quiet() -> Outputs<'static> {
        Outputs {
            json: false,
            svg_dir: None,
            diagnostics: false,
        }
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = parse(&["frame.png"]);
        assert_eq!(config_from_cli(&cli).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--threshold",
            "80",
            "--min-area",
            "500",
            "--native-size",
            "--resize-filter",
            "lanczos3",
            "frame.png",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.threshold, 80);
        assert!((config.classifier.min_area - 500.0).abs() < f64::EPSILON);
        assert_eq!(config.frame_size, None);
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);
    }

    #[test]
    fn config_file_replaces_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"threshold": 42, "classifier": {"min_area": 10.0}}"#).unwrap();
        let cli = parse(&[
            "--threshold",
            "80",
            "--config",
            path.to_str().unwrap(),
            "frame.png",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.threshold, 42);
        assert!((config.classifier.min_area - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.frame_size, Some(PipelineConfig::DEFAULT_FRAME_SIZE));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let cli = parse(&["--canny-low", "200", "--canny-high", "100", "frame.png"]);
        assert!(matches!(config_from_cli(&cli), Err(CliError::Pipeline(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cli = parse(&["--config", path.to_str().unwrap(), "frame.png"]);
        assert!(matches!(
            config_from_cli(&cli),
            Err(CliError::ConfigParse { .. })
        ));
    }

    #[test]
    fn zero_frame_width_is_rejected_by_the_parser() {
        let args = ["shapeid", "--frame-width", "0", "frame.png"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn frames_are_required() {
        assert!(Cli::try_parse_from(["shapeid"]).is_err());
    }

    #[test]
    fn last_frame_is_returned_and_bad_frames_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("0001.png");
        let broken = dir.path().join("0002.png");
        let missing = dir.path().join("0003.png");
        let last = dir.path().join("0004.png");
        write_frame(&first, Some(Rect::at(40, 40).of_size(60, 60)));
        std::fs::write(&broken, b"not an image").unwrap();
        write_frame(&last, Some(Rect::at(40, 40).of_size(120, 40)));

        let frames = vec![first, broken, missing, last.clone()];
        let result = process_frames(&frames, &PipelineConfig::default(), &quiet())
            .unwrap()
            .unwrap();

        assert_eq!(result.path, last);
        assert_eq!(result.staged.detections.len(), 1);
        assert_eq!(result.staged.detections[0].label, ShapeLabel::Rectangle);
    }

    #[test]
    fn no_readable_frames_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let frames = vec![dir.path().join("missing.png")];
        let result = process_frames(&frames, &PipelineConfig::default(), &quiet()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn svg_overlay_is_written_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let frame = dir.path().join("frame-7.png");
        write_frame(&frame, Some(Rect::at(100, 60).of_size(80, 80)));
        let svg_dir = dir.path().join("svg");
        std::fs::create_dir(&svg_dir).unwrap();

        let outputs = Outputs {
            json: true,
            svg_dir: Some(&svg_dir),
            diagnostics: true,
        };
        process_frames(&[frame], &PipelineConfig::default(), &outputs).unwrap();

        let svg = std::fs::read_to_string(svg_dir.join("00000-frame-7.svg")).unwrap();
        assert!(svg.contains(">Square</text>"));
        assert!(svg.contains("<title>frame-7</title>"));
    }

    #[test]
    fn frames_sharing_a_stem_get_separate_overlays() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("x")).unwrap();
        std::fs::create_dir(dir.path().join("y")).unwrap();
        let square = dir.path().join("x").join("0001.png");
        let rectangle = dir.path().join("y").join("0001.png");
        write_frame(&square, Some(Rect::at(100, 60).of_size(80, 80)));
        write_frame(&rectangle, Some(Rect::at(40, 40).of_size(120, 40)));
        let svg_dir = dir.path().join("svg");
        std::fs::create_dir(&svg_dir).unwrap();

        let outputs = Outputs {
            json: false,
            svg_dir: Some(&svg_dir),
            diagnostics: false,
        };
        process_frames(&[square, rectangle], &PipelineConfig::default(), &outputs).unwrap();

        let first = std::fs::read_to_string(svg_dir.join("00000-0001.svg")).unwrap();
        let second = std::fs::read_to_string(svg_dir.join("00001-0001.svg")).unwrap();
        assert!(first.contains(">Square</text>"));
        assert!(second.contains(">Rectangle</text>"));
        assert_eq!(std::fs::read_dir(&svg_dir).unwrap().count(), 2);
    }

    #[test]
    fn svg_file_names_sort_in_frame_order() {
        assert_eq!(svg_file_name(0, "a"), "00000-a.svg");
        assert!(svg_file_name(9, "z") < svg_file_name(10, "a"));
    }

    #[test]
    fn summary_line_lists_shapes() {
        let path = Path::new("f.png");
        assert_eq!(summary_line(path, &[]), "f.png: no shapes");

        let detection = |label, x: f64, y: f64| {
            let outline = Contour::new(vec![
                Point::new(x, y),
                Point::new(x + 50.0, y),
                Point::new(x + 50.0, y + 50.0),
            ]);
            let bounding_box = outline.bounding_box().unwrap();
            Detection {
                label,
                anchor: bounding_box.top_left(),
                outline,
                bounding_box,
            }
        };
        let detections = [
            detection(ShapeLabel::Square, 40.0, 40.0),
            detection(ShapeLabel::Circle, 460.0, 270.0),
        ];
        assert_eq!(
            summary_line(path, &detections),
            "f.png: Square@(40,40) Circle@(460,270)"
        );
    }

    #[test]
    fn frame_report_serializes_detections() {
        let report = FrameReport {
            index: 3,
            frame: "f.png".to_string(),
            dimensions: Dimensions {
                width: 640,
                height: 480,
            },
            detections: &[],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["index"], 3);
        assert_eq!(json["dimensions"]["width"], 640);
        assert!(json["detections"].as_array().unwrap().is_empty());
    }
}
