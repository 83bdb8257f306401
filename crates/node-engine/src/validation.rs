//! Static workflow validation
//!
//! Checks run in order and accumulate: structural completeness, edge
//! references and handles, cycles, then reachability. Only errors make a
//! graph invalid; a missing input-to-output path is a warning because
//! graphs are often partial while being edited.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::resolver::DependencyIndex;
use crate::types::{NodeKind, WorkflowGraph};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No text-input or repository-source node
    MissingEntryNode,
    /// No LLM processor node
    MissingLlmNode,
    /// No output sink node
    MissingOutputNode,
    /// An edge's source node does not exist
    UnknownSourceNode { edge_id: String, node_id: String },
    /// An edge's target node does not exist
    UnknownTargetNode { edge_id: String, node_id: String },
    /// An edge leaves from a port the source node does not declare
    UnknownSourceHandle {
        edge_id: String,
        node_id: String,
        handle: String,
    },
    /// An edge arrives at a port the target node does not declare
    UnknownTargetHandle {
        edge_id: String,
        node_id: String,
        handle: String,
    },
    /// Two edges connect the same ports
    DuplicateEdge { edge_id: String, duplicate_of: String },
    /// A cycle, as the node path that closes it (first node repeated last)
    CycleDetected { path: Vec<String> },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntryNode => {
                write!(f, "Workflow needs at least one input node (text input or repository)")
            }
            Self::MissingLlmNode => write!(f, "Workflow needs at least one LLM processor node"),
            Self::MissingOutputNode => write!(f, "Workflow needs at least one output node"),
            Self::UnknownSourceNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown source node '{}'", edge_id, node_id)
            }
            Self::UnknownTargetNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown target node '{}'", edge_id, node_id)
            }
            Self::UnknownSourceHandle {
                edge_id,
                node_id,
                handle,
            } => write!(
                f,
                "Edge '{}' uses output '{}' which node '{}' does not declare",
                edge_id, handle, node_id
            ),
            Self::UnknownTargetHandle {
                edge_id,
                node_id,
                handle,
            } => write!(
                f,
                "Edge '{}' uses input '{}' which node '{}' does not declare",
                edge_id, handle, node_id
            ),
            Self::DuplicateEdge {
                edge_id,
                duplicate_of,
            } => write!(
                f,
                "Edge '{}' duplicates edge '{}'",
                edge_id, duplicate_of
            ),
            Self::CycleDetected { path } => write!(f, "Cycle detected: {}", path.join(" → ")),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Non-fatal findings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// No directed path leads from any input node to any output node
    NoPathToOutput,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPathToOutput => write!(f, "No path connects an input node to an output node"),
        }
    }
}

/// Everything found while validating one graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// True iff there are no errors; warnings never count
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Rendered messages, for editors and logs
    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary {
            valid: self.is_valid(),
            errors: self.errors.iter().map(ToString::to_string).collect(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Wire form of a validation report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate a workflow graph
///
/// Returns all problems found (not just the first).
pub fn validate_workflow(graph: &WorkflowGraph) -> ValidationReport {
    let index = DependencyIndex::build(graph);
    let mut report = ValidationReport::default();

    validate_structure(graph, &mut report.errors);
    validate_edges(graph, &index, &mut report.errors);
    detect_cycles(graph, &index, &mut report.errors);
    check_reachability(graph, &index, &mut report.warnings);

    report
}

fn validate_structure(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    if !graph.nodes.iter().any(|n| n.kind.is_entry()) {
        errors.push(ValidationError::MissingEntryNode);
    }
    if graph.nodes_of_kind(NodeKind::LlmProcessor).next().is_none() {
        errors.push(ValidationError::MissingLlmNode);
    }
    if graph.nodes_of_kind(NodeKind::OutputSink).next().is_none() {
        errors.push(ValidationError::MissingOutputNode);
    }
}

/// Check that edge endpoints exist, use declared ports, and are unique
fn validate_edges(graph: &WorkflowGraph, index: &DependencyIndex<'_>, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<(&str, &str, &str, &str), &str> = HashMap::new();

    for edge in &graph.edges {
        let Some(source) = index.node(&edge.source) else {
            errors.push(ValidationError::UnknownSourceNode {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
            continue;
        };
        let Some(target) = index.node(&edge.target) else {
            errors.push(ValidationError::UnknownTargetNode {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
            });
            continue;
        };

        if !source.has_output(&edge.source_handle) {
            errors.push(ValidationError::UnknownSourceHandle {
                edge_id: edge.id.clone(),
                node_id: source.id.clone(),
                handle: edge.source_handle.clone(),
            });
        }
        if !target.has_input(&edge.target_handle) {
            errors.push(ValidationError::UnknownTargetHandle {
                edge_id: edge.id.clone(),
                node_id: target.id.clone(),
                handle: edge.target_handle.clone(),
            });
        }

        let key = (
            edge.source.as_str(),
            edge.source_handle.as_str(),
            edge.target.as_str(),
            edge.target_handle.as_str(),
        );
        if let Some(first) = seen.insert(key, edge.id.as_str()) {
            errors.push(ValidationError::DuplicateEdge {
                edge_id: edge.id.clone(),
                duplicate_of: first.to_string(),
            });
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnStack,
    Done,
}

/// Depth-first search from every node, reporting each back edge as a cycle
fn detect_cycles(graph: &WorkflowGraph, index: &DependencyIndex<'_>, errors: &mut Vec<ValidationError>) {
    let mut state: HashMap<&str, Visit> = HashMap::new();
    let mut path: Vec<&str> = Vec::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    for node in &graph.nodes {
        if !state.contains_key(node.id.as_str()) {
            visit(node.id.as_str(), index, &mut state, &mut path, &mut cycles);
        }
    }

    errors.extend(
        cycles
            .into_iter()
            .map(|path| ValidationError::CycleDetected { path }),
    );
}

/// Iterative DFS from `root`; each frame holds a node and its next out-edge
fn visit<'a>(
    root: &'a str,
    index: &DependencyIndex<'a>,
    state: &mut HashMap<&'a str, Visit>,
    path: &mut Vec<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    let mut frames: Vec<(&'a str, usize)> = vec![(root, 0)];
    state.insert(root, Visit::OnStack);
    path.push(root);

    while let Some((id, cursor)) = frames.last_mut() {
        let id: &'a str = *id;
        let Some(edge) = index.out_edges(id).get(*cursor) else {
            frames.pop();
            path.pop();
            state.insert(id, Visit::Done);
            continue;
        };
        *cursor += 1;

        let Some(next) = index.node(&edge.target) else {
            continue;
        };
        let next_id = next.id.as_str();
        match state.get(next_id) {
            Some(Visit::OnStack) => {
                let start = path.iter().position(|p| *p == next_id).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|p| p.to_string()).collect();
                cycle.push(next_id.to_string());
                if !cycles.contains(&cycle) {
                    cycles.push(cycle);
                }
            }
            Some(Visit::Done) => {}
            None => {
                state.insert(next_id, Visit::OnStack);
                path.push(next_id);
                frames.push((next_id, 0));
            }
        }
    }
}

/// Warn when no output node is reachable from any input node
fn check_reachability(graph: &WorkflowGraph, index: &DependencyIndex<'_>, warnings: &mut Vec<ValidationWarning>) {
    let entries: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|n| n.kind.is_entry())
        .map(|n| n.id.as_str())
        .collect();
    let has_output = graph.nodes_of_kind(NodeKind::OutputSink).next().is_some();
    if entries.is_empty() || !has_output {
        return;
    }

    let mut seen: HashSet<&str> = entries.iter().copied().collect();
    let mut queue: VecDeque<&str> = entries.into_iter().collect();
    while let Some(id) = queue.pop_front() {
        for next in index.downstream(id) {
            if next.kind == NodeKind::OutputSink {
                return;
            }
            if seen.insert(next.id.as_str()) {
                queue.push_back(next.id.as_str());
            }
        }
    }

    warnings.push(ValidationWarning::NoPathToOutput);
}
