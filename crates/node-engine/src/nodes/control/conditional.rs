//! Conditional node
//!
//! Computes a boolean only. Every downstream node is still evaluated;
//! the result is a value other nodes can consume, not a routing decision.

use serde_json::Value;

use crate::coercion::{is_truthy, to_number, to_text};
use crate::context::ExecutionContext;
use crate::nodes::{NodeConfig, PortValues};
use crate::types::GraphNode;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    /// Unrecognized names always compare false
    Unknown,
}

impl ConditionOperator {
    pub fn parse(name: &str) -> Self {
        match name {
            "equals" => Self::Equals,
            "contains" => Self::Contains,
            "startsWith" => Self::StartsWith,
            "endsWith" => Self::EndsWith,
            "greaterThan" => Self::GreaterThan,
            "lessThan" => Self::LessThan,
            _ => Self::Unknown,
        }
    }
}

/// Compare `value` against `expected`.
///
/// String operators compare text forms. Numeric operators coerce both
/// sides permissively; a NaN side makes the comparison false.
pub fn compare(operator: ConditionOperator, value: &Value, expected: &str) -> bool {
    match operator {
        ConditionOperator::Equals => to_text(value) == expected,
        ConditionOperator::Contains => to_text(value).contains(expected),
        ConditionOperator::StartsWith => to_text(value).starts_with(expected),
        ConditionOperator::EndsWith => to_text(value).ends_with(expected),
        ConditionOperator::GreaterThan => {
            to_number(value) > to_number(&Value::String(expected.to_string()))
        }
        ConditionOperator::LessThan => {
            to_number(value) < to_number(&Value::String(expected.to_string()))
        }
        ConditionOperator::Unknown => false,
    }
}

/// `input[field]` when present and truthy, otherwise the input itself
fn field_value<'a>(input: &'a Value, field: &str) -> &'a Value {
    if field.is_empty() {
        return input;
    }
    let extracted = match input {
        Value::Object(map) => map.get(field),
        Value::Array(items) => field.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    };
    extracted.filter(|v| is_truthy(v)).unwrap_or(input)
}

/// Evaluate `condition` between the (field-extracted) input and `conditionValue`
pub fn conditional(node: &GraphNode, inputs: &PortValues, context: &ExecutionContext) -> Value {
    let config = NodeConfig::new(&node.data);
    let operator = ConditionOperator::parse(&config.text_or("condition", "equals"));
    let field = context.resolve_for(&node.id, &config.text_or("conditionField", ""));
    let expected = context.resolve_for(&node.id, &config.text_or("conditionValue", ""));

    let input = inputs.first().unwrap_or(&Value::Null);
    let result = compare(operator, field_value(input, &field), &expected);
    log::debug!(
        "Conditional node '{}': {:?} {:?} -> {}",
        node.id,
        operator,
        expected,
        result
    );
    Value::Bool(result)
}
