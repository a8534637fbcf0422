//! Structural scanners over the renderer's grouped output.
//!
//! ```text
//! <g class="nodes">
//!   <g class="node" id=".." transform="translate(x, y)">
//!     <rect|polygon|circle .../>
//!     <g class="label" transform="translate(..)"><foreignObject ..>..</foreignObject></g>
//! <g class="edgePaths">
//!   <path id=".." d=".."/>
//! <g class="edgeLabels">
//!   <g class="edgeLabel" transform="translate(x, y)">
//!     <g class="label" transform="translate(..)"><foreignObject ..>..</foreignObject></g>
//! ```
//!
//! Each member is extracted on its own; nothing carries over between
//! members.

use roxmltree::{Document, Node};
use tracing::{debug, warn};

use super::element::{AnnotatedElement, ElementRole};
use super::shapes::NodeShape;
use super::text::{
    element_children, has_class, label_text, required_attr, required_non_negative_f64_attr, sized_wrapper,
};
use crate::annotation::{AnnotationIssue, AnnotationReport, IssueCode, IssueContext};
use crate::error::FlowlabelError;
use crate::geometry::{
    path_bounds, parse_optional_translation, BBoxXYXY, Coord, Diagram, TransformOffset,
};

pub const NODES_CLASS: &str = "nodes";
pub const EDGE_PATHS_CLASS: &str = "edgePaths";
pub const EDGE_LABELS_CLASS: &str = "edgeLabels";

/// Boxes extracted from one node group.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeExtraction {
    /// The shape's box, keyed by the node's label text.
    pub node: AnnotatedElement<Diagram>,
    /// The label container's box; present only when the label has text.
    pub label: Option<AnnotatedElement<Diagram>>,
}

/// All `<g>` elements whose `class` starts with `prefix`, in document order.
pub fn groups_with_class_prefix<'a, 'input>(
    doc: &'a Document<'input>,
    prefix: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants().filter(move |node| {
        node.is_element()
            && node.tag_name().name() == "g"
            && node
                .attribute("class")
                .map(|class| class.starts_with(prefix))
                .unwrap_or(false)
    })
}

/// Scans every nodes group.
///
/// Nodes drawn with an unsupported primitive are skipped and reported; any
/// other malformed geometry fails the scan.
pub fn scan_nodes(
    doc: &Document<'_>,
    report: &mut AnnotationReport,
) -> Result<Vec<NodeExtraction>, FlowlabelError> {
    let mut extractions = Vec::new();
    let members = groups_with_class_prefix(doc, NODES_CLASS).flat_map(element_children);

    for (index, member) in members.enumerate() {
        let context = IssueContext::Node {
            index,
            id: member.attribute("id").map(ToOwned::to_owned),
        };
        match extract_node(member) {
            Ok(extraction) => {
                if extraction.node.key.is_none() {
                    report.add(AnnotationIssue::warning(
                        IssueCode::MissingLabelText,
                        "node label has no text; node box emitted without a key",
                        context,
                    ));
                }
                extractions.push(extraction);
            }
            Err(FlowlabelError::UnsupportedShape { tag }) => {
                warn!("skipping {context}: unsupported shape <{tag}>");
                report.add(AnnotationIssue::warning(
                    IssueCode::UnsupportedShape,
                    format!("node drawn with <{tag}> was skipped"),
                    context,
                ));
            }
            Err(err) => return Err(err),
        }
    }

    Ok(extractions)
}

/// Extracts the shape box and the label box of one node group.
pub fn extract_node(member: Node<'_, '_>) -> Result<NodeExtraction, FlowlabelError> {
    let root = parse_optional_translation(member.attribute("transform"))?;

    let label_group = element_children(member).find(|child| has_class(*child, "label"));
    let shape_element = element_children(member)
        .find(|child| !has_class(*child, "label"))
        .ok_or_else(|| FlowlabelError::UnsupportedShape {
            tag: "<none>".to_string(),
        })?;
    let shape = NodeShape::from_element(shape_element)?.geometry();

    let origin = Coord::<Diagram>::origin().translated(root.then(shape.offset));
    let node_bbox = BBoxXYXY::from_origin_and_size(origin, shape.width, shape.height);

    let label = match label_group {
        Some(group) => extract_label(group, root)?,
        None => None,
    };
    let key = label.as_ref().and_then(|l| l.key.clone());

    Ok(NodeExtraction {
        node: AnnotatedElement::new(key, node_bbox, ElementRole::Node),
        label: label.map(|mut l| {
            l.role = ElementRole::NodeLabel;
            l
        }),
    })
}

/// Scans every edge paths group.
pub fn scan_edges(doc: &Document<'_>) -> Result<Vec<AnnotatedElement<Diagram>>, FlowlabelError> {
    groups_with_class_prefix(doc, EDGE_PATHS_CLASS)
        .flat_map(element_children)
        .map(|edge| {
            let d = required_attr(edge, "d")?;
            let bbox = path_bounds(d)?;
            Ok(AnnotatedElement::new(
                edge.attribute("id").map(ToOwned::to_owned),
                bbox,
                ElementRole::Edge,
            ))
        })
        .collect()
}

/// Scans every edge labels group.
///
/// The renderer emits an empty placeholder for unlabeled edges; those carry
/// no text and produce no box.
pub fn scan_edge_labels(
    doc: &Document<'_>,
    report: &mut AnnotationReport,
) -> Result<Vec<AnnotatedElement<Diagram>>, FlowlabelError> {
    let mut labels = Vec::new();
    let members = groups_with_class_prefix(doc, EDGE_LABELS_CLASS).flat_map(element_children);

    for (index, member) in members.enumerate() {
        let root = parse_optional_translation(member.attribute("transform"))?;
        let extracted = match element_children(member).next() {
            Some(label_group) => extract_label(label_group, root)?,
            None => None,
        };

        match extracted {
            Some(mut label) => {
                label.role = ElementRole::EdgeLabel;
                labels.push(label);
            }
            None => {
                debug!(index, "edge label without text");
                report.add(AnnotationIssue::info(
                    IssueCode::EmptyEdgeLabel,
                    "edge label placeholder without text was skipped",
                    IssueContext::EdgeLabel { index },
                ));
            }
        }
    }

    Ok(labels)
}

/// Box of a `<g class="label">` under `root`, if the label has text.
///
/// The returned element has role [`ElementRole::NodeLabel`]; callers
/// re-tag it.
fn extract_label(
    group: Node<'_, '_>,
    root: TransformOffset,
) -> Result<Option<AnnotatedElement<Diagram>>, FlowlabelError> {
    let Some(wrapper) = sized_wrapper(group) else {
        return Ok(None);
    };
    let Some(text) = label_text(wrapper) else {
        return Ok(None);
    };

    let local = parse_optional_translation(group.attribute("transform"))?;
    let width = required_non_negative_f64_attr(wrapper, "width")?;
    let height = required_non_negative_f64_attr(wrapper, "height")?;

    let origin = Coord::<Diagram>::origin().translated(root.then(local));
    Ok(Some(AnnotatedElement::new(
        Some(text),
        BBoxXYXY::from_origin_and_size(origin, width, height),
        ElementRole::NodeLabel,
    )))
}
