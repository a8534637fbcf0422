#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Two nodes joined by one labeled edge, as the renderer draws them.
///
/// In a 400×200 raster the boxes are, in record order:
/// `Start` rect (60,80,140,120), `End` circle (268,68,332,132), the edge,
/// the edge label (176,84,224,116) up to rounding and the two node labels.
pub const DIAGRAM_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50">
  <g class="root">
    <g class="edgePaths">
      <path id="L-A0-A1-0" d="M35,25C45,25 57,25 67,25"/>
    </g>
    <g class="edgeLabels">
      <g class="edgeLabel" transform="translate(50, 25)">
        <g class="label" transform="translate(-6, -4)">
          <foreignObject width="12" height="8"><div xmlns="http://www.w3.org/1999/xhtml"><span class="edgeLabel"><p>next</p></span></div></foreignObject>
        </g>
      </g>
    </g>
    <g class="nodes">
      <g class="node default" id="flowchart-A0-0" transform="translate(25, 25)">
        <rect class="basic label-container" x="-10" y="-5" width="20" height="10"/>
        <g class="label" transform="translate(-8, -4)">
          <foreignObject width="16" height="8"><div xmlns="http://www.w3.org/1999/xhtml"><span class="nodeLabel"><p>Start</p></span></div></foreignObject>
        </g>
      </g>
      <g class="node default" id="flowchart-A1-1" transform="translate(75, 25)">
        <circle r="8"/>
        <g class="label" transform="translate(-6, -4)">
          <foreignObject width="12" height="8"><div xmlns="http://www.w3.org/1999/xhtml"><span class="nodeLabel"><p>End</p></span></div></foreignObject>
        </g>
      </g>
    </g>
  </g>
</svg>"#;

pub const DIAGRAM_WIDTH: u32 = 400;
pub const DIAGRAM_HEIGHT: u32 = 200;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgb8(width, height)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("encode png");
    bytes
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, png_bytes(width, height)).expect("write png file");
}

/// Writes the fixture diagram as `dir/diagram.svg` and `dir/diagram.png`.
pub fn write_diagram(dir: &Path) -> (PathBuf, PathBuf) {
    fs::create_dir_all(dir).expect("create fixture dir");
    let svg = dir.join("diagram.svg");
    let png = dir.join("diagram.png");
    fs::write(&svg, DIAGRAM_SVG).expect("write svg file");
    write_png(&png, DIAGRAM_WIDTH, DIAGRAM_HEIGHT);
    (svg, png)
}
