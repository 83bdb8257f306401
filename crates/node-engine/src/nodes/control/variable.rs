//! Variable node

use serde_json::Value;

use crate::coercion::{is_truthy, or_default};
use crate::constants::defaults;
use crate::context::ExecutionContext;
use crate::nodes::{NodeConfig, PortValues};
use crate::types::GraphNode;

/// Where a variable node writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    /// Visible to every node in the run
    Workflow,
    /// Visible only to the writing node
    Node,
}

impl VariableScope {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "workflow" => Some(Self::Workflow),
            "node" => Some(Self::Node),
            _ => None,
        }
    }
}

/// Store the first input (or the configured default) and pass it on
pub fn variable(node: &GraphNode, inputs: &PortValues, context: &mut ExecutionContext) -> Value {
    let config = NodeConfig::new(&node.data);
    let name = config.text_or("variableName", defaults::VARIABLE_NAME);
    let scope_name = config.text_or("variableScope", "workflow");
    let scope = VariableScope::parse(&scope_name).unwrap_or_else(|| {
        log::warn!(
            "Variable node '{}' has unknown scope '{}', using workflow scope",
            node.id,
            scope_name
        );
        VariableScope::Workflow
    });

    let fallback = match config.value("variableDefaultValue") {
        Some(Value::String(s)) if !s.is_empty() => Value::String(context.resolve_for(&node.id, s)),
        Some(v) if is_truthy(v) => v.clone(),
        _ => Value::String(String::new()),
    };
    let value = or_default(inputs.first(), fallback);

    match scope {
        VariableScope::Workflow => context.set_global(name, value.clone()),
        VariableScope::Node => context.set_node_local(node.id.clone(), name, value.clone()),
    }
    value
}
