//! Graph view abstraction and the in-memory signal flow graph.
//!
//! The highlight engine never owns the graph. It reads adjacency and
//! transmittance labels through [`GraphView`] and writes style tags back
//! through the same capability, so any renderer that can answer these calls
//! can be highlighted.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HighlightError, HighlightResult};
use crate::weight::Weight;

pub type NodeId = String;
pub type EdgeId = String;

/// A directed edge as seen by the search: identity plus endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

impl EdgeRef {
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Any taggable element of the view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "group", content = "id", rename_all = "lowercase")]
pub enum ElementId {
    Node(NodeId),
    Edge(EdgeId),
}

/// Style classes the highlight engine owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightTag {
    Highlighted,
    WeakPath,
    Cycle,
    CommonEdge,
}

impl HighlightTag {
    pub const ALL: [HighlightTag; 4] = [
        HighlightTag::Highlighted,
        HighlightTag::WeakPath,
        HighlightTag::Cycle,
        HighlightTag::CommonEdge,
    ];

    /// Class name used by the renderer's stylesheet.
    pub fn class_name(&self) -> &'static str {
        match self {
            HighlightTag::Highlighted => "highlighted",
            HighlightTag::WeakPath => "weak_path",
            HighlightTag::Cycle => "cycle",
            HighlightTag::CommonEdge => "common_edge",
        }
    }
}

/// Capability interface over an externally owned graph view.
pub trait GraphView {
    fn contains_node(&self, node: &str) -> bool;

    /// Outgoing edges of `node` in insertion order. Traversal order, and
    /// therefore tie-breaking between equal gains, follows this order.
    fn outgoing_edges(&self, node: &str) -> Vec<EdgeRef>;

    /// Pre-formatted transmittance label (`<magnitude>∠<phase>`).
    fn transmittance(&self, edge: &str) -> Option<String>;

    fn elements(&self) -> Vec<ElementId>;

    fn tags(&self, element: &ElementId) -> Vec<HighlightTag>;

    fn add_tag(&mut self, element: &ElementId, tag: HighlightTag);

    fn remove_tag(&mut self, element: &ElementId, tag: HighlightTag);

    fn clear_tags(&mut self, element: &ElementId);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: Option<String>,
    /// Marks the circuit input node.
    pub is_input: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Weight,
}

impl Edge {
    pub fn to_ref(&self) -> EdgeRef {
        EdgeRef::new(self.id.clone(), self.source.clone(), self.target.clone())
    }
}

// ========== Element JSON ==========

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SfgElements {
    #[serde(default)]
    pub nodes: Vec<NodeElement>,
    #[serde(default)]
    pub edges: Vec<EdgeElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeElement {
    pub data: NodeData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub id: NodeId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "Vin", skip_serializing_if = "Option::is_none")]
    pub vin: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeElement {
    pub data: EdgeData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default)]
    pub id: Option<EdgeId>,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Weight,
}

#[derive(Deserialize)]
struct SfgSection {
    elements: SfgElements,
}

/// A circuit document (`{"sfg": {"elements": ...}}`) or bare elements.
#[derive(Deserialize)]
#[serde(untagged)]
enum ElementsDocument {
    Circuit { sfg: SfgSection },
    Bare(SfgElements),
}

// ========== In-memory graph ==========

/// Directed multigraph holding the rendered SFG and its style tags.
#[derive(Debug, Clone, Default)]
pub struct SfgGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<NodeId, usize>,
    edge_index: HashMap<EdgeId, usize>,
    /// NodeId -> indices into `edges`, in insertion order
    outgoing: HashMap<NodeId, Vec<usize>>,
    tags: HashMap<ElementId, BTreeSet<HighlightTag>>,
}

impl SfgGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> HighlightResult<Self> {
        let document: ElementsDocument = serde_json::from_str(json)
            .map_err(|e| HighlightError::InvalidGraph(format!("Invalid element JSON: {}", e)))?;
        Self::from_document(document)
    }

    pub fn from_value(value: serde_json::Value) -> HighlightResult<Self> {
        let document: ElementsDocument = serde_json::from_value(value)
            .map_err(|e| HighlightError::InvalidGraph(format!("Invalid element JSON: {}", e)))?;
        Self::from_document(document)
    }

    fn from_document(document: ElementsDocument) -> HighlightResult<Self> {
        let elements = match document {
            ElementsDocument::Circuit { sfg } => sfg.elements,
            ElementsDocument::Bare(elements) => elements,
        };
        Self::from_elements(elements)
    }

    pub fn from_elements(elements: SfgElements) -> HighlightResult<Self> {
        let mut graph = Self::new();

        for node in elements.nodes {
            let id = node.data.id.clone();
            if graph.node_index.contains_key(&id) {
                return Err(HighlightError::InvalidGraph(format!("Duplicate node ID: {}", id)));
            }
            graph.push_node(Node {
                id,
                name: node.data.name,
                is_input: node.data.vin.is_some(),
            });
        }

        for edge in elements.edges {
            let data = edge.data;
            graph.add_edge(data.id, &data.source, &data.target, data.weight)?;
        }

        Ok(graph)
    }

    /// Adds a node, returning false if it was already present.
    pub fn add_node(&mut self, id: impl Into<NodeId>) -> bool {
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return false;
        }
        self.push_node(Node {
            id,
            name: None,
            is_input: false,
        });
        true
    }

    fn push_node(&mut self, node: Node) {
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.outgoing.entry(node.id.clone()).or_default();
        self.nodes.push(node);
    }

    /// Adds a directed edge. A missing id gets a generated UUID.
    pub fn add_edge(
        &mut self,
        id: Option<EdgeId>,
        source: &str,
        target: &str,
        weight: Weight,
    ) -> HighlightResult<EdgeId> {
        for endpoint in [source, target] {
            if !self.node_index.contains_key(endpoint) {
                return Err(HighlightError::InvalidGraph(format!(
                    "Edge references missing node: {}",
                    endpoint
                )));
            }
        }

        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.edge_index.contains_key(&id) {
            return Err(HighlightError::InvalidGraph(format!("Duplicate edge ID: {}", id)));
        }

        let idx = self.edges.len();
        self.edges.push(Edge {
            id: id.clone(),
            source: source.to_string(),
            target: target.to_string(),
            weight,
        });
        self.edge_index.insert(id.clone(), idx);
        self.outgoing.entry(source.to_string()).or_default().push(idx);
        Ok(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).map(|&idx| &self.edges[idx])
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Elements that currently carry at least one tag.
    pub fn tagged_elements(&self) -> Vec<(ElementId, Vec<HighlightTag>)> {
        let mut tagged: Vec<_> = self
            .tags
            .iter()
            .filter(|(_, tags)| !tags.is_empty())
            .map(|(element, tags)| (element.clone(), tags.iter().copied().collect()))
            .collect();
        tagged.sort();
        tagged
    }
}

impl GraphView for SfgGraph {
    fn contains_node(&self, node: &str) -> bool {
        self.node_index.contains_key(node)
    }

    fn outgoing_edges(&self, node: &str) -> Vec<EdgeRef> {
        self.outgoing
            .get(node)
            .into_iter()
            .flatten()
            .map(|&idx| self.edges[idx].to_ref())
            .collect()
    }

    fn transmittance(&self, edge: &str) -> Option<String> {
        self.edge(edge).map(|e| e.weight.label())
    }

    fn elements(&self) -> Vec<ElementId> {
        self.nodes
            .iter()
            .map(|n| ElementId::Node(n.id.clone()))
            .chain(self.edges.iter().map(|e| ElementId::Edge(e.id.clone())))
            .collect()
    }

    fn tags(&self, element: &ElementId) -> Vec<HighlightTag> {
        self.tags
            .get(element)
            .map(|tags| tags.iter().copied().collect())
            .unwrap_or_default()
    }

    fn add_tag(&mut self, element: &ElementId, tag: HighlightTag) {
        self.tags.entry(element.clone()).or_default().insert(tag);
    }

    fn remove_tag(&mut self, element: &ElementId, tag: HighlightTag) {
        if let Some(tags) = self.tags.get_mut(element) {
            tags.remove(&tag);
        }
    }

    fn clear_tags(&mut self, element: &ElementId) {
        self.tags.remove(element);
    }
}
