//! Mermaid flowchart markup.

use super::style::{ClassifiedGraph, NodeStyle};

pub const MERMAID_HEADER: &str = "graph TD";

/// Writes a top-down flowchart with one line per triplet.
pub fn to_mermaid<S: NodeStyle>(graph: &ClassifiedGraph, style: &S) -> String {
    let mut markup = String::from(MERMAID_HEADER);
    for triplet in graph.graph.triplets() {
        let (Some(parent_id), Some(child_id)) = (
            graph.graph.vertex_id(&triplet.parent),
            graph.graph.vertex_id(&triplet.child),
        ) else {
            continue;
        };
        markup.push_str(&format!(
            "\n    {} -- \"{}\" --> {}",
            style.format(graph, parent_id, &triplet.parent),
            triplet.relation.replace('"', "#quot;"),
            style.format(graph, child_id, &triplet.child),
        ));
    }
    markup.push('\n');
    markup
}
