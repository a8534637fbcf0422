#![allow(dead_code)]

use flowlabel::geometry::{BBoxXYXY, Diagram};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const EPS_REMAP: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_coordinate() -> BoxedStrategy<f64> {
    (-10_000.0f64..10_000.0).boxed()
}

pub fn arb_extent() -> BoxedStrategy<f64> {
    (0.0f64..5_000.0).boxed()
}

/// Boxes inside a `width` × `height` window at the origin.
pub fn arb_bbox_within(width: f64, height: f64) -> BoxedStrategy<BBoxXYXY<Diagram>> {
    (0.0..width, 0.0..height, 0.0f64..1.0, 0.0f64..1.0)
        .prop_map(move |(x, y, fw, fh)| {
            let xmax = x + (width - x) * fw;
            let ymax = y + (height - y) * fh;
            BBoxXYXY::from_xyxy(x, y, xmax, ymax)
        })
        .boxed()
}

/// Corners of a square rhombus centered at `(cx, cy)`.
pub fn diamond(cx: f64, cy: f64, half: f64) -> Vec<(f64, f64)> {
    vec![
        (cx - half, cy),
        (cx, cy - half),
        (cx + half, cy),
        (cx, cy + half),
    ]
}

pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps * a.abs().max(b.abs()).max(1.0)
}
