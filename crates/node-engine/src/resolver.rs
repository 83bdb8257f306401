//! Dependency lookup tables for a graph
//!
//! Built once per run in O(N + E). The orchestrator uses the incoming
//! edge lists to find what feeds each input port, and the outgoing lists
//! to walk downstream from entry nodes.

use std::collections::HashMap;

use crate::types::{GraphEdge, GraphNode, WorkflowGraph};

/// Index over a borrowed graph
#[derive(Debug)]
pub struct DependencyIndex<'a> {
    nodes: HashMap<&'a str, &'a GraphNode>,
    incoming: HashMap<&'a str, Vec<&'a GraphEdge>>,
    outgoing: HashMap<&'a str, Vec<&'a GraphEdge>>,
}

impl<'a> DependencyIndex<'a> {
    /// Index every node and edge of `graph`.
    ///
    /// Edge lists keep declaration order.
    pub fn build(graph: &'a WorkflowGraph) -> Self {
        let nodes = graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut incoming: HashMap<&str, Vec<&GraphEdge>> = HashMap::new();
        let mut outgoing: HashMap<&str, Vec<&GraphEdge>> = HashMap::new();
        for edge in &graph.edges {
            incoming.entry(edge.target.as_str()).or_default().push(edge);
            outgoing.entry(edge.source.as_str()).or_default().push(edge);
        }

        Self {
            nodes,
            incoming,
            outgoing,
        }
    }

    pub fn node(&self, id: &str) -> Option<&'a GraphNode> {
        self.nodes.get(id).copied()
    }

    /// Edges targeting `id`, in declaration order
    pub fn in_edges(&self, id: &str) -> &[&'a GraphEdge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges leaving `id`, in declaration order
    pub fn out_edges(&self, id: &str) -> &[&'a GraphEdge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes feeding `id` that exist in the graph, in edge order
    pub fn upstream(&self, id: &str) -> impl Iterator<Item = &'a GraphNode> + '_ {
        self.in_edges(id).iter().filter_map(|e| self.node(&e.source))
    }

    /// Nodes consuming `id`'s outputs that exist in the graph, in edge order
    pub fn downstream(&self, id: &str) -> impl Iterator<Item = &'a GraphNode> + '_ {
        self.out_edges(id).iter().filter_map(|e| self.node(&e.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;
    use crate::types::NodeKind;

    #[test]
    fn test_index_lookups() {
        let graph = WorkflowBuilder::new("wf", "Diamond")
            .add_node("a", NodeKind::TextInput, (0.0, 0.0))
            .add_node("b", NodeKind::Transform, (0.0, 0.0))
            .add_node("c", NodeKind::Transform, (0.0, 0.0))
            .add_node("d", NodeKind::Aggregate, (0.0, 0.0))
            .connect("a", "b")
            .connect("a", "c")
            .connect("b", "d")
            .connect("c", "d")
            .build();

        let index = DependencyIndex::build(&graph);
        assert_eq!(index.node("b").map(|n| n.kind), Some(NodeKind::Transform));
        assert!(index.node("zz").is_none());

        let up: Vec<&str> = index.upstream("d").map(|n| n.id.as_str()).collect();
        assert_eq!(up, vec!["b", "c"]);
        let down: Vec<&str> = index.downstream("a").map(|n| n.id.as_str()).collect();
        assert_eq!(down, vec!["b", "c"]);
        assert!(index.in_edges("a").is_empty());
        assert!(index.out_edges("d").is_empty());
    }

    #[test]
    fn test_edges_to_missing_nodes_are_skipped() {
        let graph = WorkflowBuilder::new("wf", "Dangling")
            .add_node("a", NodeKind::OutputSink, (0.0, 0.0))
            .add_edge("ghost", "output", "a", "input")
            .build();

        let index = DependencyIndex::build(&graph);
        assert_eq!(index.in_edges("a").len(), 1);
        assert_eq!(index.upstream("a").count(), 0);
    }
}
