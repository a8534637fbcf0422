//! Debug overlay: element boxes drawn on the cropped raster.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::geometry::{BBoxXYXY, Pixel};

pub const EDGE_LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 0]); // Yellow
pub const NODE_COLOR: Rgb<u8> = Rgb([255, 0, 0]); // Red
pub const NODE_LABEL_COLOR: Rgb<u8> = Rgb([0, 128, 0]); // Green
pub const EDGE_COLOR: Rgb<u8> = Rgb([0, 0, 255]); // Blue

/// Outline thickness in pixels.
pub const OUTLINE_WIDTH: u32 = 3;

/// One group of boxes drawn in one color.
pub struct OverlayLayer<'a> {
    pub color: Rgb<u8>,
    pub boxes: Vec<&'a BBoxXYXY<Pixel>>,
}

/// Draws each layer in order on a copy of `base`; later layers paint over
/// earlier ones.
pub fn draw_overlay(base: &DynamicImage, layers: &[OverlayLayer<'_>]) -> RgbImage {
    let mut canvas = base.to_rgb8();
    for layer in layers {
        for bbox in &layer.boxes {
            draw_outline(&mut canvas, bbox, layer.color);
        }
    }
    canvas
}

/// Draws an outline growing inward from the box edge.
///
/// Edges past the canvas are pulled in to just outside it, so they stay
/// invisible and the rectangle sizes fit the drawing API.
fn draw_outline(canvas: &mut RgbImage, bbox: &BBoxXYXY<Pixel>, color: Rgb<u8>) {
    if !bbox.is_finite() {
        return;
    }
    let margin = OUTLINE_WIDTH as i64;
    let clamp_x = |x: i64| x.clamp(-margin, canvas.width() as i64 + margin);
    let clamp_y = |y: i64| y.clamp(-margin, canvas.height() as i64 + margin);
    let (xmin, ymin, xmax, ymax) = bbox.to_enclosing_pixels();
    let (xmin, ymin, xmax, ymax) = (clamp_x(xmin), clamp_y(ymin), clamp_x(xmax), clamp_y(ymax));
    for t in 0..OUTLINE_WIDTH as i64 {
        let w = xmax - xmin - 2 * t;
        let h = ymax - ymin - 2 * t;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at((xmin + t) as i32, (ymin + t) as i32).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
