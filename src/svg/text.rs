//! Attribute access and label text resolution.
//!
//! Labels are HTML inside a `<foreignObject>`:
//!
//! ```text
//! <foreignObject width="62" height="24">
//!   <div>                       container
//!     <span class="nodeLabel">  run
//!       <p>Label text</p>       paragraph
//! ```
//!
//! Older renderer versions put the text straight into the run.

use roxmltree::Node;

use crate::error::FlowlabelError;

/// Returns the first non-empty text below a label wrapper.
///
/// For each container, for each run: the run's direct text wins, otherwise
/// the full text of its first child with any.
pub(crate) fn label_text(wrapper: Node<'_, '_>) -> Option<String> {
    for container in element_children(wrapper) {
        for run in element_children(container) {
            if let Some(text) = non_empty(run.text()) {
                return Some(text);
            }
            for paragraph in element_children(run) {
                if let Some(text) = non_empty(Some(&descendant_text(paragraph))) {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// The first child carrying both `width` and `height`; the label's sizing
/// wrapper.
pub(crate) fn sized_wrapper<'a, 'input>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    element_children(node)
        .find(|child| child.has_attribute("width") && child.has_attribute("height"))
}

pub(crate) fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

pub(crate) fn has_class(node: Node<'_, '_>, class: &str) -> bool {
    node.attribute("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub(crate) fn required_attr<'a>(
    node: Node<'a, '_>,
    attribute: &str,
) -> Result<&'a str, FlowlabelError> {
    node.attribute(attribute)
        .ok_or_else(|| FlowlabelError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attribute.to_string(),
        })
}

pub(crate) fn required_f64_attr(node: Node<'_, '_>, attribute: &str) -> Result<f64, FlowlabelError> {
    let raw = required_attr(node, attribute)?;
    parse_f64_attr(node, attribute, raw)
}

/// Like [`required_f64_attr`], for sizes: negative values are rejected.
pub(crate) fn required_non_negative_f64_attr(
    node: Node<'_, '_>,
    attribute: &str,
) -> Result<f64, FlowlabelError> {
    let raw = required_attr(node, attribute)?;
    let value = parse_f64_attr(node, attribute, raw)?;
    if value < 0.0 {
        return Err(FlowlabelError::InvalidAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attribute.to_string(),
            value: raw.to_string(),
        });
    }
    Ok(value)
}

pub(crate) fn parse_f64_attr(
    node: Node<'_, '_>,
    attribute: &str,
    raw: &str,
) -> Result<f64, FlowlabelError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FlowlabelError::InvalidAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attribute.to_string(),
            value: raw.to_string(),
        })
}

fn descendant_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
}
