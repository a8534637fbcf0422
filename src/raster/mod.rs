//! Raster alignment against the SVG view window.
//!
//! The renderer's PNG export is larger than the view window scaled up: it
//! carries extra right and bottom padding. [`crop_for_renderer_padding`]
//! removes it so that the raster maps onto the view window exactly. The
//! same crop must be used for the stored image and for the debug overlay.

mod overlay;

pub use overlay::{
    draw_overlay, OverlayLayer, EDGE_COLOR, EDGE_LABEL_COLOR, NODE_COLOR, NODE_LABEL_COLOR,
    OUTLINE_WIDTH,
};

use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use crate::error::FlowlabelError;
use crate::geometry::ViewWindow;

/// Crop extent computed from the image size and view window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaddingCrop {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: u32,
    pub height: u32,
}

impl PaddingCrop {
    /// Computes the crop for an image of `width` × `height` pixels.
    ///
    /// The vertical offset is half the scaled view-window origin, the
    /// horizontal one the full origin; this asymmetry matches the renderer.
    /// The result is rounded to whole pixels and never grows the image.
    pub fn compute(width: u32, height: u32, window: &ViewWindow) -> Self {
        let scale_x = width as f64 / window.width();
        let scale_y = height as f64 / window.height();
        let offset_x = -window.min_x() * scale_x;
        let offset_y = (-window.min_y() * scale_y) / 2.0;

        let clamp = |extent: f64, original: u32| -> u32 {
            let rounded = extent.round();
            if rounded.is_nan() || rounded < 1.0 {
                1
            } else if rounded >= original as f64 {
                original
            } else {
                rounded as u32
            }
        };

        Self {
            scale_x,
            scale_y,
            offset_x,
            offset_y,
            width: clamp(width as f64 - offset_x, width),
            height: clamp(height as f64 - offset_y, height),
        }
    }

    pub fn is_noop(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

/// Crops `image` to remove the renderer's right/bottom padding.
///
/// Returns a new image; the input is left untouched.
pub fn crop_for_renderer_padding(image: &DynamicImage, window: &ViewWindow) -> DynamicImage {
    let crop = PaddingCrop::compute(image.width(), image.height(), window);
    debug!(
        from_width = image.width(),
        from_height = image.height(),
        to_width = crop.width,
        to_height = crop.height,
        "cropping renderer padding"
    );
    if crop.is_noop(image.width(), image.height()) {
        return image.clone();
    }
    image.crop_imm(0, 0, crop.width, crop.height)
}

/// Decodes a raster from disk.
pub fn load_raster(path: &Path) -> Result<DynamicImage, FlowlabelError> {
    image::open(path).map_err(|source| FlowlabelError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes a raster from memory.
pub fn decode_raster(bytes: &[u8], origin: &Path) -> Result<DynamicImage, FlowlabelError> {
    image::load_from_memory(bytes).map_err(|source| FlowlabelError::Image {
        path: origin.to_path_buf(),
        source,
    })
}

/// Encodes a raster as PNG, replacing any existing file.
pub fn save_png(image: &DynamicImage, path: &Path) -> Result<(), FlowlabelError> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| FlowlabelError::Image {
            path: path.to_path_buf(),
            source,
        })
}
