//! Fuzz target for edge path bounding boxes.

#![no_main]

use flowlabel::geometry::path_bounds;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    if let Ok(d) = std::str::from_utf8(data) {
        if let Ok(bbox) = path_bounds(d) {
            assert!(!bbox.is_finite() || bbox.is_ordered());
        }
    }
});
