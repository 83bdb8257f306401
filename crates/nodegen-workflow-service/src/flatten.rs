//! Node data flattening for storage
//!
//! Stored node data is one level deep: nested objects become dotted keys
//! (`transformConfig.pattern`) and arrays are kept as JSON strings. The
//! engine's config lookup accepts both the flattened and nested forms.

use node_engine::types::NodeData;
use node_engine::WorkflowGraph;
use serde_json::Value;

/// Flatten the data of every node in `graph`
pub fn flatten_graph(graph: &mut WorkflowGraph) {
    for node in &mut graph.nodes {
        node.data = flatten_data(&node.data);
    }
}

/// One-level copy of `data`
pub fn flatten_data(data: &NodeData) -> NodeData {
    let mut flat = NodeData::new();
    for (key, value) in data {
        flatten_into(&mut flat, key, value);
    }
    flat
}

fn flatten_into(flat: &mut NodeData, key: &str, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (child, nested) in map {
                flatten_into(flat, &format!("{}.{}", key, child), nested);
            }
        }
        Value::Array(_) => {
            flat.insert(key.to_string(), Value::String(value.to_string()));
        }
        _ => {
            flat.insert(key.to_string(), value.clone());
        }
    }
}
