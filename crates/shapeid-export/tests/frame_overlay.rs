//! Integration test: run a drawn frame through the pipeline and export the
//! detections as an SVG overlay.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

#[test]
fn drawn_frame_pipeline_to_svg() {
    let mut frame = RgbaImage::from_pixel(640, 480, Rgba([255, 255, 255, 255]));
    draw_filled_rect_mut(
        &mut frame,
        Rect::at(60, 80).of_size(150, 150),
        Rgba([0, 0, 0, 255]),
    );
    draw_filled_circle_mut(&mut frame, (450, 250), 90, Rgba([0, 0, 0, 255]));

    let config = shapeid_pipeline::PipelineConfig::default();
    let result = shapeid_pipeline::process_image(&DynamicImage::ImageRgba8(frame), &config)
        .expect("pipeline should succeed");
    assert_eq!(result.detections.len(), 2);

    let meta = shapeid_export::SvgMetadata {
        title: Some("drawn-frame"),
        description: None,
    };
    let svg = shapeid_export::to_svg(&result.detections, result.dimensions, &meta);

    assert!(svg.contains("<svg"));
    assert!(svg.contains(r#"viewBox="0 0 640 480""#));
    assert_eq!(svg.matches("<path").count(), 2);
    assert!(svg.contains(">Square</text>"));
    assert!(svg.contains(">Circle</text>"));
    assert!(svg.contains("</svg>"));
}
