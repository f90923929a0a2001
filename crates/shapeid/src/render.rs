//! Final inspection panel.
//!
//! Three views of one frame side by side: the threshold image contours
//! were traced from, the Canny edge map, and the frame with every
//! detection outlined.

use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use shapeid_pipeline::{Detection, StagedFrame};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Outline colour (opaque blue).
const OUTLINE_RGBA: [u8; 4] = [0, 0, 255, 255];
/// Outline stroke width in pixels.
const OUTLINE_WIDTH: f32 = 2.0;
/// Label anchor marker colour (opaque green).
const ANCHOR_RGBA: [u8; 4] = [0, 255, 0, 255];
/// Side of the square marker drawn at each label anchor.
const ANCHOR_SIZE: f32 = 4.0;

/// Compose the three-panel inspection image for a staged frame.
#[must_use]
pub fn panel(staged: &StagedFrame) -> RgbaImage {
    let (width, height) = staged.frame.dimensions();
    let annotated = draw_detections(&staged.frame, &staged.detections);

    let mut out = RgbaImage::new(width * 3, height);
    image::imageops::replace(&mut out, &gray_to_rgba(&staged.threshold), 0, 0);
    image::imageops::replace(&mut out, &gray_to_rgba(&staged.edges), i64::from(width), 0);
    image::imageops::replace(&mut out, &annotated, 2 * i64::from(width), 0);
    out
}

fn gray_to_rgba(image: &GrayImage) -> RgbaImage {
    DynamicImage::ImageLuma8(image.clone()).to_rgba8()
}

/// Stroke every detection outline over a copy of `frame` and mark each
/// label anchor.
///
/// Returns an unmodified copy when the frame cannot be turned into a
/// pixmap (zero-sized).
#[allow(clippy::cast_possible_truncation)]
pub fn draw_detections(frame: &RgbaImage, detections: &[Detection]) -> RgbaImage {
    let (width, height) = frame.dimensions();
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return frame.clone();
    };
    premultiply_into(frame, pixmap.data_mut());

    let stroke = Stroke {
        width: OUTLINE_WIDTH,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let mut outline_paint = Paint::default();
    let [r, g, b, a] = OUTLINE_RGBA;
    outline_paint.set_color_rgba8(r, g, b, a);
    outline_paint.anti_alias = true;

    let mut anchor_paint = Paint::default();
    let [r, g, b, a] = ANCHOR_RGBA;
    anchor_paint.set_color_rgba8(r, g, b, a);

    for detection in detections {
        let points = detection.outline.points();
        let mut pb = PathBuilder::new();
        if let Some(first) = points.first() {
            pb.move_to(first.x as f32, first.y as f32);
            for p in &points[1..] {
                pb.line_to(p.x as f32, p.y as f32);
            }
            pb.close();
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &outline_paint, &stroke, Transform::identity(), None);
        }

        let anchor = detection.anchor;
        if let Some(marker) = tiny_skia::Rect::from_xywh(
            anchor.x as f32 - ANCHOR_SIZE / 2.0,
            anchor.y as f32 - ANCHOR_SIZE / 2.0,
            ANCHOR_SIZE,
            ANCHOR_SIZE,
        ) {
            pixmap.fill_rect(marker, &anchor_paint, Transform::identity(), None);
        }
    }

    unpremultiply(pixmap.data(), width, height)
}

/// Copy straight-alpha RGBA into a premultiplied pixmap buffer.
#[allow(clippy::cast_possible_truncation)]
fn premultiply_into(frame: &RgbaImage, data: &mut [u8]) {
    for (src, dst) in frame.pixels().zip(data.chunks_exact_mut(4)) {
        let [r, g, b, a] = src.0;
        let scale = |c: u8| (u16::from(c) * u16::from(a) / 255) as u8;
        dst.copy_from_slice(&[scale(r), scale(g), scale(b), a]);
    }
}

/// Convert premultiplied pixmap data back into a straight-alpha image.
#[allow(clippy::cast_possible_truncation)]
fn unpremultiply(data: &[u8], width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for (pixel, src) in img.pixels_mut().zip(data.chunks_exact(4)) {
        let a = src[3];
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            let r = u16::from(src[0]) * 255 / u16::from(a);
            let g = u16::from(src[1]) * 255 / u16::from(a);
            let b = u16::from(src[2]) * 255 / u16::from(a);
            *pixel = Rgba([r as u8, g as u8, b as u8, a]);
        }
    }
    img
}
