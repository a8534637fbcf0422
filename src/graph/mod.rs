//! Random knowledge-graph subtrees.
//!
//! [`GraphBuilder::randomize`] walks a [`KnowledgeGraph`] breadth first from
//! a root entity, sampling a few statements per entity, and returns a
//! [`Graph`] of labelled vertices and `(parent, relation, child)` triplets.
//! [`style`] decides how vertices are drawn and [`markup`] writes them out.

mod knowledge;
pub mod markup;
pub mod style;

pub use knowledge::{
    is_entity_code, resolve_entity, Descendant, KnowledgeGraph, ResolvedEntity, WikidataClient,
    DEFAULT_SPARQL_ENDPOINT,
};
pub use markup::to_mermaid;
pub use style::{BlockClass, BlockStyle, ClassifiedGraph, NodeStyle, PlainStyle};

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use rand::{Rng, RngExt};
use tracing::{debug, info};

use crate::error::FlowlabelError;

pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_MAX_CHILDREN: usize = 3;

/// Sampling attempts per expected child.
const ATTEMPTS_PER_CHILD: usize = 5;

/// A statement between two vertices, by label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triplet {
    pub parent: String,
    pub relation: String,
    pub child: String,
}

/// A labelled tree of entities. Vertex 0 is the root.
#[derive(Clone, Debug)]
pub struct Graph {
    root_code: String,
    labels: Vec<String>,
    ids: HashMap<String, u64>,
    images: BTreeSet<u64>,
    triplets: Vec<Triplet>,
    edges: BTreeSet<(u64, u64)>,
}

impl Graph {
    fn new(root_code: &str, root_label: &str) -> Self {
        Self {
            root_code: root_code.to_string(),
            labels: vec![root_label.to_string()],
            ids: HashMap::from([(root_label.to_string(), 0)]),
            images: BTreeSet::new(),
            triplets: Vec::new(),
            edges: BTreeSet::new(),
        }
    }

    /// Entity code the walk started from.
    pub fn root_code(&self) -> &str {
        &self.root_code
    }

    pub fn root_label(&self) -> &str {
        &self.labels[0]
    }

    /// Vertex id of a label.
    pub fn vertex_id(&self, label: &str) -> Option<u64> {
        self.ids.get(label).copied()
    }

    pub fn label_of(&self, vertex_id: u64) -> Option<&str> {
        self.labels.get(vertex_id as usize).map(String::as_str)
    }

    pub fn vertex_count(&self) -> usize {
        self.labels.len()
    }

    /// `(id, label)` for every vertex, by id.
    pub fn vertices(&self) -> impl Iterator<Item = (u64, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(id, label)| (id as u64, label.as_str()))
    }

    /// Triplets sorted by `(parent id, child id)`.
    pub fn triplets(&self) -> &[Triplet] {
        &self.triplets
    }

    pub fn edges(&self) -> &BTreeSet<(u64, u64)> {
        &self.edges
    }

    pub fn has_children(&self, vertex_id: u64) -> bool {
        self.edges.iter().any(|(parent, _)| *parent == vertex_id)
    }

    /// Whether the vertex label is an image URL.
    pub fn is_image(&self, vertex_id: u64) -> bool {
        self.images.contains(&vertex_id)
    }

    fn intern(&mut self, label: &str) -> u64 {
        if let Some(id) = self.ids.get(label) {
            return *id;
        }
        let id = self.labels.len() as u64;
        self.labels.push(label.to_string());
        self.ids.insert(label.to_string(), id);
        id
    }

    fn link(&mut self, parent: &str, relation: &str, child: &str) {
        let parent_id = self.intern(parent);
        let child_id = self.intern(child);
        let triplet = Triplet {
            parent: parent.to_string(),
            relation: relation.to_string(),
            child: child.to_string(),
        };
        if !self.triplets.contains(&triplet) {
            self.triplets.push(triplet);
            self.edges.insert((parent_id, child_id));
        }
    }

    fn sort_triplets(&mut self) {
        let ids = &self.ids;
        self.triplets
            .sort_by_key(|t| (ids.get(&t.parent).copied(), ids.get(&t.child).copied()));
    }
}

/// Grows random graphs from one root entity.
pub struct GraphBuilder<'a, K: ?Sized> {
    knowledge: &'a K,
    root_code: String,
    max_children: usize,
    accept_images: bool,
}

impl<'a, K> GraphBuilder<'a, K>
where
    K: KnowledgeGraph + ?Sized,
{
    pub fn new(knowledge: &'a K, root_code: impl Into<String>) -> Self {
        Self {
            knowledge,
            root_code: root_code.into(),
            max_children: DEFAULT_MAX_CHILDREN,
            accept_images: false,
        }
    }

    /// Upper bound (exclusive) on children sampled per entity; at least 2.
    pub fn max_children(mut self, max_children: usize) -> Self {
        self.max_children = max_children;
        self
    }

    /// Keep image URL values as vertices.
    pub fn accept_images(mut self, accept_images: bool) -> Self {
        self.accept_images = accept_images;
        self
    }

    /// Walks at most `max_depth` entities breadth first.
    ///
    /// Returns [`FlowlabelError::IncompleteQueryResult`] when the root has
    /// no label or the walk found no statements to draw.
    pub fn randomize<R: Rng + ?Sized>(
        &self,
        max_depth: usize,
        rng: &mut R,
    ) -> Result<Graph, FlowlabelError> {
        if self.max_children < 2 {
            return Err(FlowlabelError::InvalidOption {
                message: format!("max children must be at least 2, got {}", self.max_children),
            });
        }

        let root_label = self.knowledge.label(&self.root_code)?.ok_or_else(|| {
            FlowlabelError::IncompleteQueryResult {
                entity: self.root_code.clone(),
                message: "root entity has no label".to_string(),
            }
        })?;

        let mut graph = Graph::new(&self.root_code, &root_label);
        let mut queue = VecDeque::from([self.root_code.clone()]);
        let mut explored = HashSet::new();
        let mut depth = 0;

        while depth < max_depth {
            let Some(code) = queue.pop_front() else {
                break;
            };
            if !explored.insert(code.clone()) {
                continue;
            }

            let children = self.knowledge.children(&code)?;
            if children.is_empty() {
                debug!(entity = %code, "no descendants; skipping");
                continue;
            }
            let Some(label) = self.knowledge.label(&code)? else {
                debug!(entity = %code, "no label; skipping");
                continue;
            };

            queue.extend(self.sample_children(&mut graph, &label, &children, rng));
            depth += 1;
        }

        graph.sort_triplets();
        if graph.triplets.is_empty() {
            return Err(FlowlabelError::IncompleteQueryResult {
                entity: self.root_code.clone(),
                message: "walk produced no statements".to_string(),
            });
        }

        info!(
            entity = %self.root_code,
            vertices = graph.vertex_count(),
            triplets = graph.triplets.len(),
            "graph randomized"
        );
        Ok(graph)
    }

    /// Links up to `max_children - 1` sampled children of `parent` and
    /// returns the entity codes to walk next.
    fn sample_children<R: Rng + ?Sized>(
        &self,
        graph: &mut Graph,
        parent: &str,
        children: &[Descendant],
        rng: &mut R,
    ) -> Vec<String> {
        let mut wanted = rng.random_range(1..self.max_children);
        if wanted > children.len() {
            return Vec::new();
        }

        let mut drawn = BTreeSet::new();
        let mut sampled = Vec::new();
        for _ in 0..self.max_children * ATTEMPTS_PER_CHILD {
            if wanted == 0 {
                break;
            }
            let index = rng.random_range(0..children.len());
            if !drawn.insert(index) {
                continue;
            }

            let child = &children[index];
            let is_image = if is_url(&child.value) {
                if !(self.accept_images && self.knowledge.is_image_url(&child.value)) {
                    continue;
                }
                true
            } else {
                false
            };
            if child.value == parent {
                continue;
            }

            graph.link(parent, &child.property, &child.value);
            if is_image {
                if let Some(id) = graph.vertex_id(&child.value) {
                    graph.images.insert(id);
                }
            }

            if !child.qid.is_empty() {
                sampled.push(child.qid.clone());
                wanted -= 1;
            }
        }
        sampled
    }
}

/// Whether a value is an http(s) URL rather than text.
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}
