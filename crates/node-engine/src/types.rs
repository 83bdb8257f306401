//! Core types for workflow graphs
//!
//! These types define the structure of workflow graphs as the editor
//! supplies them: typed nodes with declared ports, and edges connecting
//! an output port of one node to an input port of another.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a port
pub type PortId = String;

/// Type-specific node configuration
pub type NodeData = serde_json::Map<String, serde_json::Value>;

/// The closed set of node behaviors
///
/// Serialized in kebab-case. The editor's older names are accepted
/// when reading graphs (`input-text`, `github-repo`, `llm-model`,
/// `output-display`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Configured literal string
    #[serde(alias = "input-text")]
    TextInput,
    /// Directory listing, file content, or code search from a repository
    #[serde(alias = "github-repo")]
    RepositorySource,
    /// Single-message chat completion
    #[serde(alias = "llm-model")]
    LlmProcessor,
    /// Comparison producing a boolean
    Conditional,
    /// String/data operation
    Transform,
    /// Writes its input into the execution context
    Variable,
    /// Bounded iteration over items
    Loop,
    /// Combines several upstream values
    Aggregate,
    /// Run result
    #[serde(alias = "output-display")]
    OutputSink,
}

impl NodeKind {
    /// All node kinds, in palette order
    pub const ALL: [NodeKind; 9] = [
        NodeKind::TextInput,
        NodeKind::RepositorySource,
        NodeKind::LlmProcessor,
        NodeKind::Conditional,
        NodeKind::Transform,
        NodeKind::Variable,
        NodeKind::Loop,
        NodeKind::Aggregate,
        NodeKind::OutputSink,
    ];

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::TextInput => "text-input",
            NodeKind::RepositorySource => "repository-source",
            NodeKind::LlmProcessor => "llm-processor",
            NodeKind::Conditional => "conditional",
            NodeKind::Transform => "transform",
            NodeKind::Variable => "variable",
            NodeKind::Loop => "loop",
            NodeKind::Aggregate => "aggregate",
            NodeKind::OutputSink => "output-sink",
        }
    }

    /// Whether nodes of this kind count as workflow entry points for validation
    pub fn is_entry(&self) -> bool {
        matches!(self, NodeKind::TextInput | NodeKind::RepositorySource)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Input nodes (text, repository)
    Input,
    /// Output nodes
    Output,
    /// Processing nodes (LLM, transform)
    Processing,
    /// Control flow nodes (conditionals, loops, variables, aggregation)
    Control,
}

/// Canvas position; not used by execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// An edge connecting two ports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Source port ID
    pub source_handle: PortId,
    /// Target node ID
    pub target: NodeId,
    /// Target port ID
    pub target_handle: PortId,
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Behavior of this node
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Position in the editor
    #[serde(default)]
    pub position: Position,
    /// Custom data/configuration for this instance
    #[serde(default)]
    pub data: NodeData,
    /// Declared input ports, in order
    #[serde(default)]
    pub inputs: Vec<PortId>,
    /// Declared output ports, in order
    #[serde(default)]
    pub outputs: Vec<PortId>,
}

impl GraphNode {
    /// Create a node with the default ports for its kind
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        let descriptor = kind.descriptor();
        Self {
            id: id.into(),
            kind,
            position: Position::default(),
            data: NodeData::new(),
            inputs: descriptor.inputs.iter().map(|p| p.to_string()).collect(),
            outputs: descriptor.outputs.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// A node with no declared input ports
    pub fn is_entry_point(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn has_input(&self, port: &str) -> bool {
        self.inputs.iter().any(|p| p == port)
    }

    pub fn has_output(&self, port: &str) -> bool {
        self.outputs.iter().any(|p| p == port)
    }
}

/// A complete workflow graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGraph {
    /// Unique identifier for this graph
    #[serde(default)]
    pub id: String,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Nodes in the graph
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    /// Edges connecting nodes
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl WorkflowGraph {
    /// Create a new empty graph
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Nodes with no declared input ports, in graph order
    pub fn entry_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| n.is_entry_point())
    }

    /// Nodes of the given kind, in graph order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// The node whose output becomes the run result: the first output sink
    pub fn designated_output(&self) -> Option<&GraphNode> {
        self.nodes_of_kind(NodeKind::OutputSink).next()
    }
}
