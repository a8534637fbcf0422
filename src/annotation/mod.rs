//! Annotation assembly: from SVG + raster to a classified record.
//!
//! [`annotate_diagram`] runs the scanners, crops the raster, remaps every
//! box onto the cropped raster, assigns categories and draws the debug
//! overlay. The record it returns is what [`io_voc_xml`] serializes.

pub mod io_voc_xml;
mod report;

pub use report::{AnnotationIssue, AnnotationReport, IssueCode, IssueContext, Severity};

use image::{DynamicImage, RgbImage};
use tracing::{debug, warn};

use crate::error::FlowlabelError;
use crate::geometry::{BBoxXYXY, Diagram, Pixel};
use crate::raster::{
    crop_for_renderer_padding, draw_overlay, OverlayLayer, EDGE_COLOR, EDGE_LABEL_COLOR,
    NODE_COLOR, NODE_LABEL_COLOR,
};
use crate::svg::{scan_svg, AnnotatedElement, ElementRole};

/// Category for edge paths.
pub const ARROW_CATEGORY: &str = "arrow";
/// Category for node and edge labels.
pub const TEXT_CATEGORY: &str = "text";
/// Category for nodes the classifier cannot place, or all nodes without one.
pub const DEFAULT_NODE_CATEGORY: &str = "process";
/// Rasters are always written as RGB.
pub const RASTER_DEPTH: u32 = 3;

/// Maps node label text to a semantic class.
///
/// Implemented by graphs whose nodes were drawn with class-specific shapes.
pub trait NodeClassifier {
    /// Vertex id of the node whose label is `label`.
    fn vertex_id(&self, label: &str) -> Option<u64>;

    /// Class name of a vertex, in any case.
    fn class_of(&self, vertex_id: u64) -> Option<String>;

    /// Lowercased class of the node labelled `label`.
    fn classify(&self, label: &str) -> Option<String> {
        self.vertex_id(label)
            .and_then(|id| self.class_of(id))
            .map(|class| class.to_lowercase())
    }
}

/// A remapped element with its category.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedBox {
    pub category: String,
    pub element: AnnotatedElement<Pixel>,
}

/// One object entry of an annotation record.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordObject {
    pub name: String,
    pub bbox: BBoxXYXY<Pixel>,
}

impl From<&ClassifiedBox> for RecordObject {
    fn from(classified: &ClassifiedBox) -> Self {
        Self {
            name: classified.category.clone(),
            bbox: classified.element.bbox,
        }
    }
}

/// Per-diagram annotation record, in pixel space of the cropped raster.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationRecord {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub objects: Vec<RecordObject>,
}

/// Everything [`annotate_diagram`] produces for one diagram.
pub struct DiagramAnnotation {
    pub record: AnnotationRecord,
    /// Boxes in record order: nodes, edges, edge labels, node labels.
    pub boxes: Vec<ClassifiedBox>,
    /// The raster with renderer padding removed.
    pub cropped: DynamicImage,
    /// The cropped raster with every box outlined.
    pub overlay: RgbImage,
    pub report: AnnotationReport,
}

/// Annotates one rendered diagram.
///
/// `raster` is the renderer's PNG for the same source as `svg`; it is not
/// modified. Boxes are remapped against the cropped raster, whose size is
/// also the size written to the record.
pub fn annotate_diagram(
    svg: &str,
    raster: &DynamicImage,
    filename: &str,
    classifier: Option<&dyn NodeClassifier>,
) -> Result<DiagramAnnotation, FlowlabelError> {
    let scanned = scan_svg(svg)?;
    let mut report = scanned.report;

    let cropped = crop_for_renderer_padding(raster, &scanned.view_window);
    let (width, height) = (cropped.width(), cropped.height());
    let remap = |element: &AnnotatedElement<Diagram>| {
        element.remap(&scanned.view_window, width as f64, height as f64)
    };

    let mut boxes = Vec::with_capacity(
        scanned.nodes.len()
            + scanned.edges.len()
            + scanned.edge_labels.len()
            + scanned.node_labels.len(),
    );

    for (index, node) in scanned.nodes.iter().enumerate() {
        let category = node_category(node.key.as_deref(), classifier, index, &mut report);
        boxes.push(ClassifiedBox {
            category,
            element: remap(node),
        });
    }
    for edge in &scanned.edges {
        boxes.push(ClassifiedBox {
            category: ARROW_CATEGORY.to_string(),
            element: remap(edge),
        });
    }
    for label in scanned.edge_labels.iter().chain(&scanned.node_labels) {
        boxes.push(ClassifiedBox {
            category: TEXT_CATEGORY.to_string(),
            element: remap(label),
        });
    }

    let overlay = draw_overlay(
        &cropped,
        &[
            overlay_layer(&boxes, ElementRole::EdgeLabel, EDGE_LABEL_COLOR),
            overlay_layer(&boxes, ElementRole::Node, NODE_COLOR),
            overlay_layer(&boxes, ElementRole::NodeLabel, NODE_LABEL_COLOR),
            overlay_layer(&boxes, ElementRole::Edge, EDGE_COLOR),
        ],
    );

    if report.warning_count() > 0 {
        warn!(filename, "{}", report.to_string().trim_end());
    }
    debug!(filename, objects = boxes.len(), width, height, "annotated diagram");

    let record = AnnotationRecord {
        filename: filename.to_string(),
        width,
        height,
        depth: RASTER_DEPTH,
        objects: boxes.iter().map(RecordObject::from).collect(),
    };

    Ok(DiagramAnnotation {
        record,
        boxes,
        cropped,
        overlay,
        report,
    })
}

fn node_category(
    key: Option<&str>,
    classifier: Option<&dyn NodeClassifier>,
    index: usize,
    report: &mut AnnotationReport,
) -> String {
    let Some(classifier) = classifier else {
        return DEFAULT_NODE_CATEGORY.to_string();
    };

    match key.and_then(|label| classifier.classify(label)) {
        Some(class) => class,
        None => {
            report.add(AnnotationIssue::warning(
                IssueCode::UnclassifiedNode,
                format!(
                    "no class for node label {:?}; using '{}'",
                    key.unwrap_or_default(),
                    DEFAULT_NODE_CATEGORY
                ),
                IssueContext::Node { index, id: None },
            ));
            DEFAULT_NODE_CATEGORY.to_string()
        }
    }
}

fn overlay_layer(
    boxes: &[ClassifiedBox],
    role: ElementRole,
    color: image::Rgb<u8>,
) -> OverlayLayer<'_> {
    OverlayLayer {
        color,
        boxes: boxes
            .iter()
            .filter(|b| b.element.role == role)
            .map(|b| &b.element.bbox)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50">
  <g class="edgePaths"><path id="L-A0-A1-0" d="M10,10L10,20"/></g>
  <g class="edgeLabels">
    <g class="edgeLabel" transform="translate(20, 20)">
      <g class="label" transform="translate(-5, -5)">
        <foreignObject width="10" height="10"><div><span><p>has</p></span></div></foreignObject>
      </g>
    </g>
  </g>
  <g class="nodes">
    <g class="node" id="flowchart-A0-0" transform="translate(50, 25)">
      <rect x="-10" y="-5" width="20" height="10"/>
      <g class="label" transform="translate(-8, -4)">
        <foreignObject width="16" height="8"><div><span><p>Start</p></span></div></foreignObject>
      </g>
    </g>
  </g>
</svg>"#;

    struct Classes(HashMap<&'static str, (u64, &'static str)>);

    impl NodeClassifier for Classes {
        fn vertex_id(&self, label: &str) -> Option<u64> {
            self.0.get(label).map(|(id, _)| *id)
        }

        fn class_of(&self, vertex_id: u64) -> Option<String> {
            self.0
                .values()
                .find(|(id, _)| *id == vertex_id)
                .map(|(_, class)| class.to_string())
        }
    }

    #[test]
    fn record_order_and_categories() {
        let raster = DynamicImage::new_rgb8(400, 200);
        let result = annotate_diagram(SVG, &raster, "d.png", None).unwrap();

        let names: Vec<&str> = result
            .record
            .objects
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, ["process", "arrow", "text", "text"]);
        assert_eq!(result.boxes[2].element.role, ElementRole::EdgeLabel);
        assert_eq!(result.boxes[3].element.role, ElementRole::NodeLabel);
        assert_eq!((result.record.width, result.record.height), (400, 200));
        assert_eq!(result.record.depth, 3);
    }

    #[test]
    fn boxes_are_scaled_onto_the_raster() {
        let raster = DynamicImage::new_rgb8(400, 200);
        let result = annotate_diagram(SVG, &raster, "d.png", None).unwrap();
        assert_eq!(
            result.record.objects[0].bbox,
            BBoxXYXY::from_xyxy(160.0, 80.0, 240.0, 120.0)
        );
    }

    #[test]
    fn classifier_classes_are_lowercased() {
        let classes = Classes(HashMap::from([("Start", (0, "Terminator"))]));
        let raster = DynamicImage::new_rgb8(400, 200);
        let result = annotate_diagram(SVG, &raster, "d.png", Some(&classes)).unwrap();
        assert_eq!(result.record.objects[0].name, "terminator");
        assert!(result.report.is_clean());
    }

    #[test]
    fn unknown_label_falls_back_to_default_with_warning() {
        let classes = Classes(HashMap::new());
        let raster = DynamicImage::new_rgb8(400, 200);
        let result = annotate_diagram(SVG, &raster, "d.png", Some(&classes)).unwrap();
        assert_eq!(result.record.objects[0].name, DEFAULT_NODE_CATEGORY);
        assert_eq!(result.report.count(IssueCode::UnclassifiedNode), 1);
    }

    #[test]
    fn oversized_node_is_annotated() {
        let svg = r#"<svg viewBox="0 0 100 100"><g class="nodes">
            <g class="node" transform="translate(0, 40)"><rect width="1073741824" height="20"/></g>
        </g></svg>"#;
        let raster = DynamicImage::new_rgb8(400, 400);
        let result = annotate_diagram(svg, &raster, "d.png", None).unwrap();
        assert_eq!(result.record.objects.len(), 1);
        assert_eq!(result.overlay.dimensions(), (400, 400));
    }

    #[test]
    fn negative_node_width_is_rejected() {
        let svg = r#"<svg viewBox="0 0 100 100"><g class="nodes">
            <g class="node" transform="translate(50, 50)"><rect width="-40" height="20"/></g>
        </g></svg>"#;
        let raster = DynamicImage::new_rgb8(400, 400);
        assert!(matches!(
            annotate_diagram(svg, &raster, "d.png", None),
            Err(FlowlabelError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn overlay_matches_cropped_size() {
        let svg = SVG.replace("viewBox=\"0 0 100 50\"", "viewBox=\"-10 -10 100 50\"");
        let raster = DynamicImage::new_rgb8(400, 200);
        let result = annotate_diagram(&svg, &raster, "d.png", None).unwrap();
        assert_eq!((result.cropped.width(), result.cropped.height()), (360, 180));
        assert_eq!(result.overlay.dimensions(), (360, 180));
        assert_eq!(result.record.width, 360);
    }
}
