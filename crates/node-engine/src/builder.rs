//! Fluent builder for workflow graphs
//!
//! Provides a fluent API for constructing graphs programmatically, with
//! each node getting the default ports of its kind.

use crate::types::{GraphEdge, GraphNode, NodeKind, Position, WorkflowGraph};

/// Fluent builder for constructing workflow graphs
///
/// # Example
///
/// ```
/// use node_engine::{NodeKind, WorkflowBuilder};
///
/// let graph = WorkflowBuilder::new("wf-1", "My Workflow")
///     .add_node("prompt", NodeKind::TextInput, (0.0, 0.0))
///     .with_data(serde_json::json!({"value": "Hello"}))
///     .add_node("llm", NodeKind::LlmProcessor, (200.0, 0.0))
///     .add_node("result", NodeKind::OutputSink, (400.0, 0.0))
///     .connect("prompt", "llm")
///     .connect("llm", "result")
///     .build();
/// assert_eq!(graph.edges.len(), 2);
/// ```
pub struct WorkflowBuilder {
    id: String,
    name: String,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    edge_counter: usize,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_counter: 0,
        }
    }

    /// Add a node with the default ports for its kind
    pub fn add_node(mut self, id: impl Into<String>, kind: NodeKind, position: (f64, f64)) -> Self {
        let mut node = GraphNode::new(id, kind);
        node.position = Position {
            x: position.0,
            y: position.1,
        };
        self.nodes.push(node);
        self
    }

    /// Set data on the most recently added node
    ///
    /// Non-object values are ignored. Must be called immediately after `add_node`.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        if let (Some(node), serde_json::Value::Object(map)) = (self.nodes.last_mut(), data) {
            node.data = map;
        }
        self
    }

    /// Replace the declared ports of the most recently added node
    pub fn with_ports(mut self, inputs: &[&str], outputs: &[&str]) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.inputs = inputs.iter().map(|p| p.to_string()).collect();
            node.outputs = outputs.iter().map(|p| p.to_string()).collect();
        }
        self
    }

    /// Connect `output` of `source` to `input` of `target`
    pub fn connect(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.add_edge(source, "output", target, "input")
    }

    /// Add an edge between two nodes (auto-generates edge ID)
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        let edge_id = format!("edge-{}", self.edge_counter);
        self.add_edge_with_id(edge_id, source, source_port, target, target_port)
    }

    /// Add an edge with an explicit ID
    pub fn add_edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.edges.push(GraphEdge {
            id: edge_id.into(),
            source: source.into(),
            source_handle: source_port.into(),
            target: target.into(),
            target_handle: target_port.into(),
        });
        self
    }

    /// Build the graph without validation
    pub fn build(self) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new(self.id, self.name);
        graph.nodes = self.nodes;
        graph.edges = self.edges;
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_basic() {
        let graph = WorkflowBuilder::new("wf", "Test")
            .add_node("in", NodeKind::TextInput, (10.0, 20.0))
            .with_data(json!({"value": "hi"}))
            .add_node("out", NodeKind::OutputSink, (0.0, 0.0))
            .connect("in", "out")
            .build();

        assert_eq!(graph.id, "wf");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].position, Position { x: 10.0, y: 20.0 });
        assert_eq!(graph.nodes[0].data["value"], json!("hi"));
        assert_eq!(graph.edges[0].id, "edge-1");
        assert_eq!(graph.edges[0].source_handle, "output");
        assert_eq!(graph.edges[0].target_handle, "input");
    }

    #[test]
    fn test_builder_custom_ports_and_edge_ids() {
        let graph = WorkflowBuilder::new("wf", "Test")
            .add_node("agg", NodeKind::Aggregate, (0.0, 0.0))
            .with_ports(&["a", "b"], &["output"])
            .add_edge_with_id("custom", "x", "output", "agg", "a")
            .build();

        assert_eq!(graph.nodes[0].inputs, vec!["a", "b"]);
        assert_eq!(graph.edges[0].id, "custom");
    }
}
