//! Loop node
//!
//! Produces the per-iteration values without re-running downstream
//! nodes. Output length never exceeds `maxIterations`, which is itself
//! capped at [`defaults::MAX_LOOP_ITERATIONS`].

use serde_json::Value;

use crate::constants::defaults;
use crate::nodes::{NodeConfig, PortValues};
use crate::types::GraphNode;

/// Loop flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// One iteration per item
    ForEach,
    /// Emits `0..maxIterations`
    Count,
    /// Condition-driven loops have no body to evaluate and yield nothing
    While,
}

impl LoopKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "foreach" => Some(Self::ForEach),
            "count" => Some(Self::Count),
            "while" => Some(Self::While),
            _ => None,
        }
    }
}

/// Items to iterate: the `items` port, else the `input` port, else none.
/// Arrays are used as-is, scalars are wrapped.
fn items(inputs: &PortValues) -> Vec<Value> {
    match inputs.get("items").or_else(|| inputs.get("input")) {
        Some(Value::Array(items)) => items.clone(),
        Some(value) => vec![value.clone()],
        None => Vec::new(),
    }
}

/// Evaluate the configured loop
pub fn loop_items(node: &GraphNode, inputs: &PortValues) -> Value {
    let config = NodeConfig::new(&node.data);
    let max_iterations = config
        .count_or("maxIterations", defaults::MAX_ITERATIONS)
        .min(defaults::MAX_LOOP_ITERATIONS);
    let kind_name = config.text_or("loopType", "foreach");

    let results: Vec<Value> = match LoopKind::parse(&kind_name) {
        Some(LoopKind::ForEach) => items(inputs).into_iter().take(max_iterations).collect(),
        Some(LoopKind::Count) => (0..max_iterations).map(Value::from).collect(),
        Some(LoopKind::While) => Vec::new(),
        None => {
            log::warn!("Loop node '{}' has unknown type '{}'", node.id, kind_name);
            Vec::new()
        }
    };
    Value::Array(results)
}
