//! Node shape primitives and their local geometry.
//!
//! The renderer positions each node group at the node's centre and draws
//! the shape relative to it, with a different convention per primitive.
//! [`NodeShape::geometry`] turns each convention into a top-left offset
//! plus size, relative to the node group.

use roxmltree::Node;

use super::text::{parse_f64_attr, required_non_negative_f64_attr};
use crate::error::FlowlabelError;
use crate::geometry::{parse_optional_translation, TransformOffset};

/// Horizontal correction for polygons that are not regular diamonds
/// (parallelograms and friends); their transform is padded differently.
pub const IRREGULAR_POLYGON_SHIFT: f64 = 11.3333;

/// Relative tolerance used when comparing diamond sides and midpoints.
pub const DIAMOND_TOLERANCE: f64 = 1e-6;

/// A node's drawing primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeShape {
    Polygon {
        points: Vec<(f64, f64)>,
        transform: TransformOffset,
    },
    Circle {
        radius: f64,
    },
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// Size and top-left offset of a shape, relative to its node group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeGeometry {
    pub width: f64,
    pub height: f64,
    pub offset: TransformOffset,
}

impl NodeShape {
    /// Reads a shape element.
    ///
    /// Tags other than `polygon`, `circle` and `rect` are
    /// [`FlowlabelError::UnsupportedShape`].
    pub fn from_element(node: Node<'_, '_>) -> Result<Self, FlowlabelError> {
        match node.tag_name().name() {
            "polygon" => {
                let raw = node.attribute("points").unwrap_or_default();
                let points = parse_points(raw).ok_or_else(|| FlowlabelError::InvalidAttribute {
                    element: "polygon".to_string(),
                    attribute: "points".to_string(),
                    value: raw.to_string(),
                })?;
                let transform = parse_optional_translation(node.attribute("transform"))?;
                Ok(NodeShape::Polygon { points, transform })
            }
            "circle" => Ok(NodeShape::Circle {
                radius: required_non_negative_f64_attr(node, "r")?,
            }),
            "rect" => {
                let optional = |name: &str| {
                    node.attribute(name)
                        .map(|raw| parse_f64_attr(node, name, raw))
                        .unwrap_or(Ok(0.0))
                };
                Ok(NodeShape::Rectangle {
                    x: optional("x")?,
                    y: optional("y")?,
                    width: required_non_negative_f64_attr(node, "width")?,
                    height: required_non_negative_f64_attr(node, "height")?,
                })
            }
            other => Err(FlowlabelError::UnsupportedShape {
                tag: other.to_string(),
            }),
        }
    }

    /// Local size and offset of the shape.
    pub fn geometry(&self) -> ShapeGeometry {
        match self {
            NodeShape::Polygon { points, transform } => {
                let (min_x, min_y, max_x, max_y) = points.iter().fold(
                    (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                    |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                );
                // The polygon's translate is Y-flipped relative to its points.
                let dx = if is_regular_diamond(points) {
                    transform.dx
                } else {
                    transform.dx - IRREGULAR_POLYGON_SHIFT
                };
                ShapeGeometry {
                    width: max_x - min_x,
                    height: max_y - min_y,
                    offset: TransformOffset::new(dx, -transform.dy),
                }
            }
            NodeShape::Circle { radius } => ShapeGeometry {
                width: 2.0 * radius,
                height: 2.0 * radius,
                offset: TransformOffset::new(-radius, -radius),
            },
            NodeShape::Rectangle {
                x,
                y,
                width,
                height,
            } => ShapeGeometry {
                width: *width,
                height: *height,
                offset: TransformOffset::new(*x, *y),
            },
        }
    }
}

/// True for four points with equal sides whose diagonals bisect each other.
pub fn is_regular_diamond(points: &[(f64, f64)]) -> bool {
    if points.len() != 4 {
        return false;
    }

    let dist = |a: (f64, f64), b: (f64, f64)| (a.0 - b.0).hypot(a.1 - b.1);
    let sides: Vec<f64> = (0..4).map(|i| dist(points[i], points[(i + 1) % 4])).collect();
    if !sides.iter().all(|side| is_close(*side, sides[0])) {
        return false;
    }

    let mid_a = (
        (points[0].0 + points[2].0) / 2.0,
        (points[0].1 + points[2].1) / 2.0,
    );
    let mid_b = (
        (points[1].0 + points[3].0) / 2.0,
        (points[1].1 + points[3].1) / 2.0,
    );
    is_close(mid_a.0, mid_b.0) && is_close(mid_a.1, mid_b.1)
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= DIAMOND_TOLERANCE * a.abs().max(b.abs())
}

/// Parses `"x,y x,y ..."`; commas and whitespace both separate numbers.
fn parse_points(raw: &str) -> Option<Vec<(f64, f64)>> {
    let numbers: Vec<f64> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f64>().ok())
        .collect::<Option<_>>()?;

    if numbers.is_empty() || numbers.len() % 2 != 0 {
        return None;
    }
    Some(numbers.chunks(2).map(|pair| (pair[0], pair[1])).collect())
}
