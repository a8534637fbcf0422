//! Typed coordinate values using PhantomData for compile-time safety.

use std::marker::PhantomData;

use super::transform::TransformOffset;

/// A 2D point with a type-level marker for the coordinate space.
///
/// The `TSpace` parameter is one of [`Diagram`](super::Diagram),
/// [`Normalized`](super::Normalized) or [`Pixel`](super::Pixel).
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    /// Creates a new coordinate with the given x and y values.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    /// The origin of the space.
    #[inline]
    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Returns this point moved by a translation.
    #[inline]
    pub fn translated(self, offset: TransformOffset) -> Self {
        Self::new(self.x + offset.dx, self.y + offset.dy)
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<TSpace> Default for Coord<TSpace> {
    fn default() -> Self {
        Self::origin()
    }
}
