//! Text input node

use serde_json::Value;

use crate::nodes::NodeConfig;
use crate::types::GraphNode;

/// The configured `value`, verbatim. Placeholders are filled in by the
/// orchestrator when the string reaches a downstream input.
///
/// Unset or falsy values produce the empty string.
pub fn text_input(node: &GraphNode) -> Value {
    Value::String(NodeConfig::new(&node.data).text_or("value", ""))
}
