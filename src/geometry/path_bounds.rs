//! Tight bounding boxes of SVG path data.
//!
//! Edges are emitted as `<path d="...">`, usually a move followed by cubic
//! curves. The box includes each curve's true extrema, found from the roots
//! of its derivative, so it is never looser than the control hull.

use svgtypes::{SimplePathSegment, SimplifyingPathParser};

use super::{BBoxXYXY, Diagram};
use crate::error::FlowlabelError;

#[derive(Clone, Copy, Debug)]
struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Extent {
    fn at(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Computes the bounding box of path data `d` in diagram space.
///
/// Relative commands, shorthand curves and arcs are accepted. An axis with
/// zero extent (a straight horizontal or vertical edge, or a single point)
/// is widened by one unit.
pub fn path_bounds(d: &str) -> Result<BBoxXYXY<Diagram>, FlowlabelError> {
    let invalid = |message: String| FlowlabelError::InvalidPathData {
        path_data: d.to_string(),
        message,
    };

    let mut extent: Option<Extent> = None;
    let mut current = (0.0_f64, 0.0_f64);
    let mut subpath_start = current;
    let mut last_move: Option<(f64, f64)> = None;

    for segment in SimplifyingPathParser::from(d) {
        let segment = segment.map_err(|source| invalid(source.to_string()))?;
        match segment {
            SimplePathSegment::MoveTo { x, y } => {
                current = (x, y);
                subpath_start = current;
                last_move = Some(current);
            }
            SimplePathSegment::LineTo { x, y } => {
                let e = extent.get_or_insert_with(|| Extent::at(current.0, current.1));
                e.include(current.0, current.1);
                e.include(x, y);
                current = (x, y);
            }
            SimplePathSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let e = extent.get_or_insert_with(|| Extent::at(current.0, current.1));
                include_cubic(e, current, (x1, y1), (x2, y2), (x, y));
                current = (x, y);
            }
            SimplePathSegment::Quadratic { x1, y1, x, y } => {
                let e = extent.get_or_insert_with(|| Extent::at(current.0, current.1));
                include_quadratic(e, current, (x1, y1), (x, y));
                current = (x, y);
            }
            SimplePathSegment::ClosePath => {
                if let Some(e) = extent.as_mut() {
                    e.include(subpath_start.0, subpath_start.1);
                }
                current = subpath_start;
            }
        }
    }

    let extent = extent
        .or_else(|| last_move.map(|(x, y)| Extent::at(x, y)))
        .ok_or_else(|| invalid("path has no segments".to_string()))?;

    Ok(
        BBoxXYXY::from_xyxy(extent.min_x, extent.min_y, extent.max_x, extent.max_y)
            .inflate_degenerate(),
    )
}

fn cubic_at(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * mt * p0 + 3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t * p3
}

/// Parameters in (0, 1) where one axis of a cubic has zero derivative.
fn cubic_extrema(p0: f64, p1: f64, p2: f64, p3: f64) -> Vec<f64> {
    const EPS: f64 = 1e-12;

    // B'(t) / 3 = a t^2 + b t + c
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = 2.0 * (p0 - 2.0 * p1 + p2);
    let c = p1 - p0;

    let mut roots = Vec::with_capacity(2);
    if a.abs() <= EPS {
        if b.abs() > EPS {
            roots.push(-c / b);
        }
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let s = disc.sqrt();
            roots.push((-b + s) / (2.0 * a));
            roots.push((-b - s) / (2.0 * a));
        }
    }

    roots.retain(|t| *t > 0.0 && *t < 1.0);
    roots
}

fn include_cubic(
    extent: &mut Extent,
    p0: (f64, f64),
    p1: (f64, f64),
    p2: (f64, f64),
    p3: (f64, f64),
) {
    extent.include(p0.0, p0.1);
    extent.include(p3.0, p3.1);

    let ts = cubic_extrema(p0.0, p1.0, p2.0, p3.0)
        .into_iter()
        .chain(cubic_extrema(p0.1, p1.1, p2.1, p3.1));
    for t in ts {
        extent.include(
            cubic_at(p0.0, p1.0, p2.0, p3.0, t),
            cubic_at(p0.1, p1.1, p2.1, p3.1, t),
        );
    }
}

fn include_quadratic(extent: &mut Extent, p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) {
    extent.include(p0.0, p0.1);
    extent.include(p2.0, p2.1);

    let quad_at = |a: f64, b: f64, c: f64, t: f64| {
        let mt = 1.0 - t;
        mt * mt * a + 2.0 * mt * t * b + t * t * c
    };

    for (a, b, c) in [(p0.0, p1.0, p2.0), (p0.1, p1.1, p2.1)] {
        let denom = a - 2.0 * b + c;
        if denom.abs() <= 1e-12 {
            continue;
        }
        let t = (a - b) / denom;
        if t > 0.0 && t < 1.0 {
            extent.include(
                quad_at(p0.0, p1.0, p2.0, t),
                quad_at(p0.1, p1.1, p2.1, t),
            );
        }
    }
}
