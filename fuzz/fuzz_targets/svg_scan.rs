//! Fuzz target for scanning renderer SVG.
//!
//! Arbitrary text must scan to boxes or an error, never a panic.

#![no_main]

use flowlabel::svg::scan_svg;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(svg) = std::str::from_utf8(data) else {
        return;
    };

    let _ = scan_svg(svg);
});
