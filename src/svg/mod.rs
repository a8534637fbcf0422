//! Reading the flowchart renderer's SVG output.
//!
//! [`scan_svg`] parses a rendered diagram and returns every node, node
//! label, edge and edge label box in diagram space, together with the view
//! window needed to map them onto the raster.

mod element;
mod scan;
mod shapes;
mod text;

pub use element::{AnnotatedElement, ElementRole};
pub use scan::{
    extract_node, groups_with_class_prefix, scan_edge_labels, scan_edges, scan_nodes,
    NodeExtraction, EDGE_LABELS_CLASS, EDGE_PATHS_CLASS, NODES_CLASS,
};
pub use shapes::{
    is_regular_diamond, NodeShape, ShapeGeometry, DIAMOND_TOLERANCE, IRREGULAR_POLYGON_SHIFT,
};

use roxmltree::{Document, ParsingOptions};

use crate::annotation::AnnotationReport;
use crate::error::FlowlabelError;
use crate::geometry::{Diagram, ViewWindow};

/// Everything extracted from one SVG, in diagram space.
#[derive(Clone, Debug)]
pub struct ScannedDiagram {
    pub view_window: ViewWindow,
    pub nodes: Vec<AnnotatedElement<Diagram>>,
    pub edges: Vec<AnnotatedElement<Diagram>>,
    pub edge_labels: Vec<AnnotatedElement<Diagram>>,
    pub node_labels: Vec<AnnotatedElement<Diagram>>,
    pub report: AnnotationReport,
}

/// Parses SVG text into a document.
pub fn parse_document(svg: &str) -> Result<Document<'_>, FlowlabelError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(svg, options).map_err(|source| FlowlabelError::SvgParse {
        message: source.to_string(),
    })
}

/// Reads the root element's `viewBox`.
pub fn view_window(doc: &Document<'_>) -> Result<ViewWindow, FlowlabelError> {
    let root = doc.root_element();
    let raw = root
        .attribute("viewBox")
        .ok_or_else(|| FlowlabelError::MissingAttribute {
            element: root.tag_name().name().to_string(),
            attribute: "viewBox".to_string(),
        })?;
    ViewWindow::parse(raw)
}

/// Scans nodes, edges, edge labels and node labels, in that order.
pub fn scan_svg(svg: &str) -> Result<ScannedDiagram, FlowlabelError> {
    let doc = parse_document(svg)?;
    let view_window = view_window(&doc)?;
    let mut report = AnnotationReport::new();

    let extractions = scan_nodes(&doc, &mut report)?;
    let edges = scan_edges(&doc)?;
    let edge_labels = scan_edge_labels(&doc, &mut report)?;

    let mut nodes = Vec::with_capacity(extractions.len());
    let mut node_labels = Vec::new();
    for extraction in extractions {
        nodes.push(extraction.node);
        node_labels.extend(extraction.label);
    }

    Ok(ScannedDiagram {
        view_window,
        nodes,
        edges,
        edge_labels,
        node_labels,
        report,
    })
}
