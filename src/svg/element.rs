//! Elements found by the scanners.

use serde::Serialize;

use crate::geometry::{BBoxXYXY, Diagram, Pixel, ViewWindow};

/// What part of the flowchart a box covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
    Node,
    NodeLabel,
    Edge,
    EdgeLabel,
}

impl ElementRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementRole::Node => "node",
            ElementRole::NodeLabel => "node_label",
            ElementRole::Edge => "edge",
            ElementRole::EdgeLabel => "edge_label",
        }
    }
}

/// One box extracted from the SVG.
///
/// `key` is the label text for nodes and labels, and the element `id` for
/// edges. It is `None` when the SVG carries neither.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnotatedElement<TSpace> {
    pub key: Option<String>,
    pub bbox: BBoxXYXY<TSpace>,
    pub role: ElementRole,
}

impl<TSpace> AnnotatedElement<TSpace> {
    pub fn new(key: Option<String>, bbox: BBoxXYXY<TSpace>, role: ElementRole) -> Self {
        Self { key, bbox, role }
    }
}

impl AnnotatedElement<Diagram> {
    /// Moves the element onto a raster that shows exactly `window`.
    pub fn remap(
        &self,
        window: &ViewWindow,
        raster_width: f64,
        raster_height: f64,
    ) -> AnnotatedElement<Pixel> {
        AnnotatedElement {
            key: self.key.clone(),
            bbox: window.remap(&self.bbox, raster_width, raster_height),
            role: self.role,
        }
    }
}
