//! LLM processor node

use serde_json::Value;

use crate::capabilities::ChatMessage;
use crate::coercion::is_truthy;
use crate::constants::defaults;
use crate::error::Result;
use crate::nodes::{NodeConfig, NodeRuntime, PortValues};
use crate::types::GraphNode;

/// Prompt text for the first input: strings as-is, other values as JSON,
/// falsy or missing input as the empty string
fn prompt(inputs: &PortValues) -> String {
    match inputs.first() {
        Some(Value::String(s)) => s.clone(),
        Some(value) if is_truthy(value) => value.to_string(),
        _ => String::new(),
    }
}

/// Send the input as a single user message and return the reply
pub async fn llm_processor(
    node: &GraphNode,
    inputs: &PortValues,
    runtime: &NodeRuntime<'_>,
) -> Result<Value> {
    let model = NodeConfig::new(&node.data).text_or("model", defaults::MODEL);
    let messages = [ChatMessage::user(prompt(inputs))];

    log::debug!("LLM node '{}' calling model {}", node.id, model);
    let reply = runtime
        .call(
            "chat completion",
            runtime.capabilities.chat.complete_chat(&model, &messages),
        )
        .await?;
    Ok(Value::String(reply))
}
