//! The SVG view window and the diagram → pixel remap.

use super::{BBoxXYXY, Diagram, Normalized, Pixel};
use crate::error::FlowlabelError;

/// The declared visible region of the vector graphic (`viewBox`).
///
/// Width and height are always positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewWindow {
    min_x: f64,
    min_y: f64,
    width: f64,
    height: f64,
}

impl ViewWindow {
    /// Creates a view window, rejecting empty or non-finite extents.
    pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Result<Self, FlowlabelError> {
        let finite = [min_x, min_y, width, height].iter().all(|v| v.is_finite());
        if !finite || width <= 0.0 || height <= 0.0 {
            return Err(FlowlabelError::InvalidViewWindow {
                view_box: format!("{min_x} {min_y} {width} {height}"),
                message: "width and height must be positive and finite".to_string(),
            });
        }
        Ok(Self {
            min_x,
            min_y,
            width,
            height,
        })
    }

    /// Parses a `viewBox` attribute (`"min_x min_y width height"`, whitespace
    /// and/or comma separated).
    pub fn parse(raw: &str) -> Result<Self, FlowlabelError> {
        let values: Vec<f64> = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(str::parse::<f64>)
            .collect::<Result<_, _>>()
            .map_err(|source| FlowlabelError::InvalidViewWindow {
                view_box: raw.to_string(),
                message: source.to_string(),
            })?;

        match values.as_slice() {
            [min_x, min_y, width, height] => Self::new(*min_x, *min_y, *width, *height),
            _ => Err(FlowlabelError::InvalidViewWindow {
                view_box: raw.to_string(),
                message: format!("expected 4 numbers, found {}", values.len()),
            }),
        }
    }

    #[inline]
    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    #[inline]
    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Expresses a diagram box as fractions of this window, per axis.
    pub fn normalize(&self, bbox: &BBoxXYXY<Diagram>) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(
            (bbox.xmin() - self.min_x) / self.width,
            (bbox.ymin() - self.min_y) / self.height,
            (bbox.xmax() - self.min_x) / self.width,
            (bbox.ymax() - self.min_y) / self.height,
        )
    }

    /// Maps a diagram box onto a raster of `raster_width` × `raster_height`
    /// pixels that shows exactly this window.
    pub fn remap(
        &self,
        bbox: &BBoxXYXY<Diagram>,
        raster_width: f64,
        raster_height: f64,
    ) -> BBoxXYXY<Pixel> {
        self.normalize(bbox).to_pixel(raster_width, raster_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_and_comma_separated() {
        let vw = ViewWindow::parse("-8 -8 216.5 182").unwrap();
        assert_eq!(vw, ViewWindow::new(-8.0, -8.0, 216.5, 182.0).unwrap());

        let vw = ViewWindow::parse("0,0, 100,50").unwrap();
        assert_eq!(vw.width(), 100.0);
        assert_eq!(vw.height(), 50.0);
    }

    #[test]
    fn rejects_bad_view_boxes() {
        for raw in ["", "0 0 100", "0 0 0 10", "0 0 10 -1", "a b c d", "0 0 1 1 1"] {
            assert!(
                matches!(
                    ViewWindow::parse(raw),
                    Err(FlowlabelError::InvalidViewWindow { .. })
                ),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn remap_scales_each_axis_independently() {
        let vw = ViewWindow::new(0.0, 0.0, 100.0, 50.0).unwrap();
        let bbox = BBoxXYXY::from_xyxy(10.0, 10.0, 20.0, 20.0);
        let mapped = vw.remap(&bbox, 400.0, 200.0);
        assert_eq!(mapped, BBoxXYXY::from_xyxy(40.0, 40.0, 80.0, 80.0));
    }

    #[test]
    fn remap_subtracts_window_origin() {
        let vw = ViewWindow::new(-8.0, -4.0, 100.0, 100.0).unwrap();
        let bbox = BBoxXYXY::from_xyxy(-8.0, -4.0, 42.0, 46.0);
        let mapped = vw.remap(&bbox, 200.0, 100.0);
        assert_eq!(mapped, BBoxXYXY::from_xyxy(0.0, 0.0, 100.0, 50.0));
    }
}
