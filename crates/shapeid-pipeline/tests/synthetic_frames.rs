//! Integration test: draw known shapes onto a frame and run the full
//! pipeline over it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::f64::consts::TAU;

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;
use imageproc::rect::Rect;
use shapeid_pipeline::{
    Detection, PipelineConfig, ShapeLabel, process, process_image, process_staged,
};

const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);
const PAPER: Rgba<u8> = Rgba([245, 245, 245, 255]);

fn blank_frame() -> RgbaImage {
    RgbaImage::from_pixel(640, 480, PAPER)
}

#[allow(clippy::cast_possible_truncation)]
fn regular_polygon(cx: f64, cy: f64, radius: f64, sides: usize) -> Vec<PixelPoint<i32>> {
    #[allow(clippy::cast_precision_loss)]
    (0..sides)
        .map(|i| {
            let a = TAU * i as f64 / sides as f64;
            PixelPoint::new(
                radius.mul_add(a.cos(), cx).round() as i32,
                radius.mul_add(a.sin(), cy).round() as i32,
            )
        })
        .collect()
}

/// One of every label plus a speck too small to survive the area filter.
fn gallery() -> RgbaImage {
    let mut frame = blank_frame();
    draw_filled_rect_mut(&mut frame, Rect::at(40, 40).of_size(100, 100), INK);
    draw_filled_rect_mut(&mut frame, Rect::at(200, 60).of_size(200, 80), INK);
    draw_filled_rect_mut(&mut frame, Rect::at(600, 20).of_size(10, 10), INK);
    draw_polygon_mut(
        &mut frame,
        &[
            PixelPoint::new(60, 420),
            PixelPoint::new(220, 420),
            PixelPoint::new(140, 280),
        ],
        INK,
    );
    draw_polygon_mut(&mut frame, &regular_polygon(330.0, 340.0, 70.0, 6), INK);
    draw_filled_circle_mut(&mut frame, (530, 340), 70, INK);
    frame
}

fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )
    .unwrap();
    buf
}

#[test]
fn gallery_frame_labels_every_shape() {
    let frame = DynamicImage::ImageRgba8(gallery());
    let result = process_image(&frame, &PipelineConfig::default()).unwrap();

    let mut labels: Vec<ShapeLabel> = result.detections.iter().map(|d| d.label).collect();
    labels.sort();
    assert_eq!(
        labels,
        vec![
            ShapeLabel::Triangle,
            ShapeLabel::Square,
            ShapeLabel::Rectangle,
            ShapeLabel::Polygon,
            ShapeLabel::Circle,
        ]
    );
}

#[test]
fn detections_follow_trace_order() {
    let frame = DynamicImage::ImageRgba8(gallery());
    let result = process_image(&frame, &PipelineConfig::default()).unwrap();

    // The speck is traced first but filtered; the square's top edge is
    // reached before the rectangle's.
    assert_eq!(result.detections[0].label, ShapeLabel::Square);
    assert_eq!(result.detections[1].label, ShapeLabel::Rectangle);
}

#[test]
fn anchors_sit_at_bounding_box_corners() {
    let frame = DynamicImage::ImageRgba8(gallery());
    let result = process_image(&frame, &PipelineConfig::default()).unwrap();

    let square = &result.detections[0];
    assert!((square.anchor.x - 40.0).abs() <= 1.0, "{:?}", square.anchor);
    assert!((square.anchor.y - 40.0).abs() <= 1.0, "{:?}", square.anchor);
    assert_eq!(square.anchor, square.bounding_box.top_left());
}

#[test]
fn speck_alone_yields_nothing() {
    let mut frame = blank_frame();
    draw_filled_rect_mut(&mut frame, Rect::at(300, 200).of_size(15, 15), INK);
    let result = process(&encode_png(&frame), &PipelineConfig::default()).unwrap();
    assert!(result.detections.is_empty());
}

#[test]
fn light_shapes_are_background() {
    let mut frame = blank_frame();
    draw_filled_rect_mut(
        &mut frame,
        Rect::at(100, 100).of_size(200, 200),
        Rgba([180, 180, 180, 255]),
    );
    let result = process(&encode_png(&frame), &PipelineConfig::default()).unwrap();
    assert!(result.detections.is_empty());
}

#[test]
fn lower_threshold_config_from_json_changes_foreground() {
    let mut frame = blank_frame();
    draw_filled_rect_mut(
        &mut frame,
        Rect::at(100, 100).of_size(200, 200),
        Rgba([180, 180, 180, 255]),
    );
    let config: PipelineConfig = serde_json::from_str(r#"{"threshold": 200}"#).unwrap();
    let result = process(&encode_png(&frame), &config).unwrap();
    assert_eq!(result.detections.len(), 1);
    assert_eq!(result.detections[0].label, ShapeLabel::Square);
}

#[test]
fn larger_frames_are_resized_before_detection() {
    let mut frame = RgbaImage::from_pixel(1280, 960, PAPER);
    draw_filled_rect_mut(&mut frame, Rect::at(200, 200).of_size(400, 400), INK);
    let staged = process_staged(&encode_png(&frame), &PipelineConfig::default()).unwrap();

    assert_eq!(staged.frame.dimensions(), (640, 480));
    assert_eq!(staged.detections.len(), 1);
    assert_eq!(staged.detections[0].label, ShapeLabel::Square);
    let bbox = staged.detections[0].bounding_box;
    assert!((bbox.width - 200.0).abs() <= 3.0, "{bbox:?}");
}

/// The single detection in a frame holding one `w` x `h` block.
fn detect_block(w: u32, h: u32) -> Detection {
    let mut frame = blank_frame();
    draw_filled_rect_mut(&mut frame, Rect::at(150, 120).of_size(w, h), INK);
    let frame = DynamicImage::ImageRgba8(frame);
    let mut detections = process_image(&frame, &PipelineConfig::default())
        .unwrap()
        .detections;
    assert_eq!(detections.len(), 1, "{w}x{h}");
    detections.remove(0)
}

#[test]
fn drawn_block_box_counts_whole_pixels() {
    let detection = detect_block(100, 40);
    let bbox = detection.bounding_box;
    assert!((bbox.width - 100.0).abs() < f64::EPSILON, "{bbox:?}");
    assert!((bbox.height - 40.0).abs() < f64::EPSILON, "{bbox:?}");
    assert!((bbox.aspect_ratio().unwrap() - 2.5).abs() < f64::EPSILON);
    assert_eq!(detection.label, ShapeLabel::Rectangle);
}

#[test]
fn drawn_blocks_at_the_square_band_edges() {
    for (w, h, expected) in [
        (105, 100, ShapeLabel::Square),
        (106, 100, ShapeLabel::Rectangle),
        (95, 100, ShapeLabel::Square),
        (94, 100, ShapeLabel::Rectangle),
    ] {
        assert_eq!(detect_block(w, h).label, expected, "{w}x{h}");
    }
}
