//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters so that a box
//! read from the vector graphic can never be drawn on a raster without an
//! explicit remap step.

use std::fmt;

/// Marker type for diagram coordinates.
///
/// Diagram coordinates are the user units of the rendered SVG, the space in
/// which its `viewBox` is declared and all `translate(..)` offsets compose.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diagram {}

/// Marker type for normalized coordinates (0.0 to 1.0 inside the view window).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

/// Marker type for pixel coordinates of the final, cropped raster.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

impl fmt::Debug for Diagram {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
