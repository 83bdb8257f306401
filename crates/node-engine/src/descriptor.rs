//! Static metadata for each node kind
//!
//! The editor palette and the graph builder read labels, categories and
//! default ports from here. Adding a `NodeKind` variant fails to compile
//! until it is described.

use serde::Serialize;

use crate::types::{NodeCategory, NodeKind};

/// Metadata for a node kind
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    /// The kind being described
    pub kind: NodeKind,
    /// Category for UI grouping
    pub category: NodeCategory,
    /// Human-readable label
    pub label: &'static str,
    /// What the node does
    pub description: &'static str,
    /// Default input ports for new nodes
    pub inputs: &'static [&'static str],
    /// Default output ports for new nodes
    pub outputs: &'static [&'static str],
}

const INPUT: &[&str] = &["input"];
const OUTPUT: &[&str] = &["output"];
const NONE: &[&str] = &[];

impl NodeKind {
    /// Describe this kind
    pub fn descriptor(&self) -> NodeDescriptor {
        let (category, label, description, inputs, outputs) = match self {
            NodeKind::TextInput => (
                NodeCategory::Input,
                "Text Prompt",
                "Emits a configured text, with {{variables}} filled in",
                NONE,
                OUTPUT,
            ),
            NodeKind::RepositorySource => (
                NodeCategory::Input,
                "Repository",
                "Lists a directory, reads a file, or searches code in a repository",
                NONE,
                OUTPUT,
            ),
            NodeKind::LlmProcessor => (
                NodeCategory::Processing,
                "LLM Processor",
                "Sends its input to a chat model and emits the reply",
                INPUT,
                OUTPUT,
            ),
            NodeKind::Conditional => (
                NodeCategory::Control,
                "Conditional",
                "Compares its input against a value and emits a boolean",
                INPUT,
                OUTPUT,
            ),
            NodeKind::Transform => (
                NodeCategory::Processing,
                "Transform",
                "Applies a string or data operation",
                INPUT,
                OUTPUT,
            ),
            NodeKind::Variable => (
                NodeCategory::Control,
                "Variable",
                "Stores its input in the execution context",
                INPUT,
                OUTPUT,
            ),
            NodeKind::Loop => (
                NodeCategory::Control,
                "Loop",
                "Iterates over items up to a maximum count",
                INPUT,
                OUTPUT,
            ),
            NodeKind::Aggregate => (
                NodeCategory::Control,
                "Aggregate",
                "Combines all connected values",
                INPUT,
                OUTPUT,
            ),
            NodeKind::OutputSink => (
                NodeCategory::Output,
                "Result",
                "Holds the final result of the run",
                INPUT,
                NONE,
            ),
        };

        NodeDescriptor {
            kind: *self,
            category,
            label,
            description,
            inputs,
            outputs,
        }
    }
}

/// Descriptors for every node kind, in palette order
pub fn all_descriptors() -> Vec<NodeDescriptor> {
    NodeKind::ALL.iter().map(NodeKind::descriptor).collect()
}
