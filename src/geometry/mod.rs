//! Geometry primitives shared by the SVG scanners and the raster stage.
//!
//! Boxes carry their coordinate space as a type parameter: scanners produce
//! [`BBoxXYXY<Diagram>`], the annotation record holds [`BBoxXYXY<Pixel>`],
//! and the only way between the two is [`ViewWindow::remap`].
//!
//! # Example
//!
//! ```
//! use flowlabel::geometry::{BBoxXYXY, Diagram, ViewWindow};
//!
//! let window = ViewWindow::new(0.0, 0.0, 100.0, 50.0).unwrap();
//! let bbox: BBoxXYXY<Diagram> = BBoxXYXY::from_xyxy(10.0, 10.0, 20.0, 20.0);
//! let pixels = window.remap(&bbox, 400.0, 200.0);
//! assert_eq!((pixels.xmin(), pixels.ymax()), (40.0, 80.0));
//! ```

mod bbox;
mod coord;
mod path_bounds;
mod space;
mod transform;
mod view_window;

pub use bbox::BBoxXYXY;
pub use coord::Coord;
pub use path_bounds::path_bounds;
pub use space::{Diagram, Normalized, Pixel};
pub use transform::{apply_offset, parse_optional_translation, parse_translation, TransformOffset};
pub use view_window::ViewWindow;
