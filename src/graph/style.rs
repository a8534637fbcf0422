//! How vertices are drawn.
//!
//! A [`NodeStyle`] assigns each vertex of a [`Graph`] a [`BlockClass`] and
//! formats vertices as flowchart nodes. [`PlainStyle`] draws every vertex as
//! a rounded box and classifies nothing; [`BlockStyle`] picks flowchart
//! block classes at random and draws each with its own shape.

use std::collections::BTreeMap;

use rand::{Rng, RngExt};

use super::Graph;
use crate::annotation::NodeClassifier;

/// Flowchart block classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockClass {
    Process,
    Decision,
    Data,
    Connection,
    Terminator,
}

impl BlockClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockClass::Process => "Process",
            BlockClass::Decision => "Decision",
            BlockClass::Data => "Data",
            BlockClass::Connection => "Connection",
            BlockClass::Terminator => "Terminator",
        }
    }

    /// Wraps node content in this class's shape delimiters.
    pub fn wrap(&self, content: &str) -> String {
        match self {
            BlockClass::Terminator => format!("([{content}])"), // stadium
            BlockClass::Process => format!("[{content}]"),      // rectangle
            BlockClass::Decision => format!("{{{content}}}"),   // diamond
            BlockClass::Data => format!("[/{content}/]"),       // parallelogram
            BlockClass::Connection => format!("(({content}))"), // circle
        }
    }
}

/// A graph plus the class picked for each vertex.
#[derive(Clone, Debug)]
pub struct ClassifiedGraph {
    pub graph: Graph,
    classes: BTreeMap<u64, BlockClass>,
}

impl ClassifiedGraph {
    /// A graph without any classes.
    pub fn unclassified(graph: Graph) -> Self {
        Self {
            graph,
            classes: BTreeMap::new(),
        }
    }

    pub fn class(&self, vertex_id: u64) -> Option<BlockClass> {
        self.classes.get(&vertex_id).copied()
    }

    pub fn is_classified(&self) -> bool {
        !self.classes.is_empty()
    }
}

impl NodeClassifier for ClassifiedGraph {
    fn vertex_id(&self, label: &str) -> Option<u64> {
        self.graph.vertex_id(label)
    }

    fn class_of(&self, vertex_id: u64) -> Option<String> {
        self.class(vertex_id).map(|class| class.as_str().to_string())
    }
}

/// Strategy for classifying and drawing vertices.
pub trait NodeStyle {
    /// Picks classes for every vertex.
    fn assign<R: Rng + ?Sized>(&self, graph: Graph, rng: &mut R) -> ClassifiedGraph;

    /// Formats one vertex as a node reference with its label.
    fn format(&self, graph: &ClassifiedGraph, vertex_id: u64, label: &str) -> String;
}

/// Every vertex as `A<id>("label")`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainStyle;

impl NodeStyle for PlainStyle {
    fn assign<R: Rng + ?Sized>(&self, graph: Graph, _rng: &mut R) -> ClassifiedGraph {
        ClassifiedGraph::unclassified(graph)
    }

    fn format(&self, graph: &ClassifiedGraph, vertex_id: u64, label: &str) -> String {
        let content = node_content(label, graph.graph.is_image(vertex_id));
        format!("A{vertex_id}({content})")
    }
}

/// Random flowchart block classes, one shape per class.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockStyle;

impl BlockStyle {
    fn pick<R: Rng + ?Sized>(graph: &Graph, vertex_id: u64, rng: &mut R) -> BlockClass {
        use BlockClass::*;

        if vertex_id == 0 {
            weighted(&[(Terminator, 0.8), (Process, 0.2)], rng)
        } else if !graph.has_children(vertex_id) {
            weighted(&[(Terminator, 0.5), (Process, 0.5)], rng)
        } else {
            weighted(
                &[(Process, 0.4), (Data, 0.2), (Decision, 0.2), (Connection, 0.2)],
                rng,
            )
        }
    }
}

impl NodeStyle for BlockStyle {
    fn assign<R: Rng + ?Sized>(&self, graph: Graph, rng: &mut R) -> ClassifiedGraph {
        let classes = graph
            .vertices()
            .map(|(id, _)| (id, Self::pick(&graph, id, rng)))
            .collect();
        ClassifiedGraph { graph, classes }
    }

    fn format(&self, graph: &ClassifiedGraph, vertex_id: u64, label: &str) -> String {
        let content = node_content(label, graph.graph.is_image(vertex_id));
        let class = graph.class(vertex_id).unwrap_or(BlockClass::Process);
        format!("A{vertex_id}{}", class.wrap(&content))
    }
}

fn weighted<R: Rng + ?Sized>(choices: &[(BlockClass, f64)], rng: &mut R) -> BlockClass {
    let total: f64 = choices.iter().map(|(_, weight)| weight).sum();
    let mut draw = rng.random::<f64>() * total;
    for (class, weight) in choices {
        if draw < *weight {
            return *class;
        }
        draw -= weight;
    }
    choices[choices.len() - 1].0
}

/// Quoted label text, or an `<img>` tag for image vertices.
fn node_content(label: &str, is_image: bool) -> String {
    if is_image {
        format!("<img src='{label}' width='50' height='50'>")
    } else {
        format!("\"{}\"", escape_label(label))
    }
}

/// Escapes characters the markup would otherwise interpret.
pub fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::graph::{Descendant, GraphBuilder, KnowledgeGraph};
    use crate::FlowlabelError;

    struct Chain;

    impl KnowledgeGraph for Chain {
        fn label(&self, code: &str) -> Result<Option<String>, FlowlabelError> {
            Ok(Some(format!("entity {code}")))
        }

        fn entity_code(&self, _label: &str) -> Result<Option<String>, FlowlabelError> {
            Ok(None)
        }

        fn children(&self, code: &str) -> Result<Vec<Descendant>, FlowlabelError> {
            let next: u32 = code[1..].parse().unwrap_or(0) + 1;
            Ok(vec![Descendant {
                qid: format!("Q{next}"),
                value: format!("entity Q{next}"),
                property: "followed by".to_string(),
            }])
        }
    }

    fn chain(seed: u64) -> Graph {
        GraphBuilder::new(&Chain, "Q1")
            .max_children(2)
            .randomize(3, &mut StdRng::seed_from_u64(seed))
            .unwrap()
    }

    #[test]
    fn plain_style_quotes_labels() {
        let graph = PlainStyle.assign(chain(0), &mut StdRng::seed_from_u64(0));
        assert!(!graph.is_classified());
        assert_eq!(PlainStyle.format(&graph, 0, "entity Q1"), "A0(\"entity Q1\")");
        assert_eq!(
            PlainStyle.format(&graph, 1, r#"the "best""#),
            "A1(\"the #quot;best#quot;\")"
        );
    }

    #[test]
    fn block_style_classes_follow_position() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let graph = BlockStyle.assign(chain(seed), &mut rng);
            let root = graph.class(0).unwrap();
            assert!(matches!(root, BlockClass::Terminator | BlockClass::Process));

            let leaf = (graph.graph.vertex_count() - 1) as u64;
            assert!(!graph.graph.has_children(leaf));
            assert!(matches!(
                graph.class(leaf).unwrap(),
                BlockClass::Terminator | BlockClass::Process
            ));

            for inner in 1..leaf {
                assert_ne!(graph.class(inner), Some(BlockClass::Terminator));
            }
        }
    }

    #[test]
    fn block_shapes() {
        assert_eq!(BlockClass::Terminator.wrap("x"), "([x])");
        assert_eq!(BlockClass::Process.wrap("x"), "[x]");
        assert_eq!(BlockClass::Decision.wrap("x"), "{x}");
        assert_eq!(BlockClass::Data.wrap("x"), "[/x/]");
        assert_eq!(BlockClass::Connection.wrap("x"), "((x))");
    }

    #[test]
    fn classified_graph_answers_the_classifier() {
        let graph = BlockStyle.assign(chain(1), &mut StdRng::seed_from_u64(1));
        let class = graph.classify("entity Q1").unwrap();
        assert_eq!(class, graph.class(0).unwrap().as_str().to_lowercase());
        assert_eq!(graph.classify("missing"), None);
    }
}
