//! Transform node
//!
//! `transformOperation` selects the operation (default `extract`); the
//! separator or regex comes from `transformConfig.pattern`, with
//! `transformPattern` accepted as a flat alternative.

use regex::Regex;
use serde_json::Value;

use crate::coercion::to_text;
use crate::constants::defaults;
use crate::nodes::{NodeConfig, PortValues};
use crate::types::GraphNode;

/// Supported transform operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOperation {
    Uppercase,
    Lowercase,
    Trim,
    Split,
    Extract,
    Format,
    Parse,
    Merge,
    /// Unknown operation names pass the input through
    Identity,
}

impl TransformOperation {
    pub fn parse(name: &str) -> Self {
        match name {
            "uppercase" => Self::Uppercase,
            "lowercase" => Self::Lowercase,
            "trim" => Self::Trim,
            "split" => Self::Split,
            "extract" => Self::Extract,
            "format" => Self::Format,
            "parse" => Self::Parse,
            "merge" => Self::Merge,
            _ => Self::Identity,
        }
    }
}

/// Apply the configured operation to the first input
pub fn transform(node: &GraphNode, inputs: &PortValues) -> Value {
    let config = NodeConfig::new(&node.data);
    let operation = TransformOperation::parse(&config.text_or("transformOperation", "extract"));
    let pattern = config.text_any_or(&["transformConfig.pattern", "transformPattern"], "");
    let input = inputs.first().cloned().unwrap_or(Value::Null);

    match operation {
        TransformOperation::Uppercase => Value::String(to_text(&input).to_uppercase()),
        TransformOperation::Lowercase => Value::String(to_text(&input).to_lowercase()),
        TransformOperation::Trim => Value::String(to_text(&input).trim().to_string()),
        TransformOperation::Split => {
            let separator = if pattern.is_empty() {
                defaults::SPLIT_SEPARATOR
            } else {
                pattern.as_str()
            };
            split(&to_text(&input), separator)
        }
        TransformOperation::Extract => extract(&node.id, input, &pattern),
        TransformOperation::Format => Value::String(to_text(&input)),
        TransformOperation::Parse => parse_json(input),
        TransformOperation::Merge => Value::Array(inputs.values().cloned().collect()),
        TransformOperation::Identity => input,
    }
}

fn split(text: &str, separator: &str) -> Value {
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        text.split(separator)
            .map(|part| Value::String(part.to_string()))
            .collect()
    };
    Value::Array(parts)
}

/// All regex matches concatenated; no pattern returns the input unchanged
fn extract(node_id: &str, input: Value, pattern: &str) -> Value {
    if pattern.is_empty() {
        return input;
    }
    match Regex::new(pattern) {
        Ok(re) => {
            let text = to_text(&input);
            Value::String(re.find_iter(&text).map(|m| m.as_str()).collect())
        }
        Err(e) => {
            log::warn!("Transform node '{}' has an invalid pattern: {}", node_id, e);
            Value::String(format!("[Transform: invalid pattern: {}]", pattern))
        }
    }
}

/// JSON-parse strings; anything unparseable is returned as-is
fn parse_json(input: Value) -> Value {
    if let Value::String(s) = &input {
        if let Ok(parsed) = serde_json::from_str(s) {
            return parsed;
        }
    }
    input
}
