//! Aggregate node
//!
//! Combines every non-null input value. The operation comes from
//! `aggregateOperation` (older graphs use `operation`).

use serde_json::{Map, Value};

use crate::coercion::{number_value, to_number, to_number_or_zero, to_text};
use crate::constants::defaults;
use crate::nodes::{NodeConfig, PortValues};
use crate::types::GraphNode;

/// Aggregation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOperation {
    Concat,
    Join,
    Sum,
    Average,
    Min,
    Max,
    Count,
    Merge,
    /// Unknown names collect the values into an array
    Collect,
}

impl AggregateOperation {
    pub fn parse(name: &str) -> Self {
        match name {
            "concat" => Self::Concat,
            "join" => Self::Join,
            "sum" => Self::Sum,
            "average" | "avg" => Self::Average,
            "min" => Self::Min,
            "max" => Self::Max,
            "count" => Self::Count,
            "merge" => Self::Merge,
            _ => Self::Collect,
        }
    }
}

/// Combine the present input values
pub fn aggregate(node: &GraphNode, inputs: &PortValues) -> Value {
    let config = NodeConfig::new(&node.data);
    let operation =
        AggregateOperation::parse(&config.text_any_or(&["aggregateOperation", "operation"], "concat"));
    let separator = config.text_or("aggregateSeparator", defaults::JOIN_SEPARATOR);
    let values: Vec<&Value> = inputs.values().filter(|v| !v.is_null()).collect();

    match operation {
        AggregateOperation::Concat | AggregateOperation::Join => Value::String(
            values
                .iter()
                .map(|v| to_text(v))
                .collect::<Vec<_>>()
                .join(&separator),
        ),
        AggregateOperation::Sum => number_value(sum(&values)),
        AggregateOperation::Average => {
            if values.is_empty() {
                Value::from(0)
            } else {
                number_value(sum(&values) / values.len() as f64)
            }
        }
        AggregateOperation::Min => extreme(&values, f64::min),
        AggregateOperation::Max => extreme(&values, f64::max),
        AggregateOperation::Count => Value::from(values.len()),
        AggregateOperation::Merge => {
            let mut merged = Map::new();
            for value in &values {
                if let Value::Object(map) = value {
                    for (key, field) in map {
                        merged.insert(key.clone(), field.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        AggregateOperation::Collect => Value::Array(values.into_iter().cloned().collect()),
    }
}

fn sum(values: &[&Value]) -> f64 {
    values.iter().map(|v| to_number_or_zero(v)).sum()
}

/// Smallest/largest numeric value; non-numeric values are skipped
fn extreme(values: &[&Value], pick: fn(f64, f64) -> f64) -> Value {
    values
        .iter()
        .map(|v| to_number(v))
        .filter(|n| !n.is_nan())
        .reduce(pick)
        .map_or(Value::Null, number_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::test_support::node;
    use crate::types::NodeKind;
    use serde_json::json;

    fn run(data: Value, values: Vec<Value>) -> Value {
        let inputs: PortValues = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("input{}", i + 1), v))
            .collect();
        aggregate(&node(NodeKind::Aggregate, data), &inputs)
    }

    #[test]
    fn test_sum_coerces_and_skips_null() {
        let out = run(json!({"aggregateOperation": "sum"}), vec![json!(3), json!("4"), Value::Null]);
        assert_eq!(out, json!(7));
    }

    #[test]
    fn test_sum_treats_text_as_zero() {
        let out = run(json!({"aggregateOperation": "sum"}), vec![json!(1.5), json!("abc")]);
        assert_eq!(out, json!(1.5));
    }

    #[test]
    fn test_average() {
        assert_eq!(run(json!({"aggregateOperation": "average"}), vec![json!(2), json!(4)]), json!(3));
        assert_eq!(run(json!({"aggregateOperation": "avg"}), vec![]), json!(0));
    }

    #[test]
    fn test_concat_default_separator() {
        assert_eq!(run(json!({}), vec![json!("a"), json!(1), json!(true)]), json!("a 1 true"));
        assert_eq!(
            run(json!({"aggregateOperation": "join", "aggregateSeparator": ", "}), vec![json!("a"), json!("b")]),
            json!("a, b")
        );
    }

    #[test]
    fn test_min_max_count() {
        let values = vec![json!(3), json!("10"), json!("x"), Value::Null];
        assert_eq!(run(json!({"operation": "min"}), values.clone()), json!(3));
        assert_eq!(run(json!({"operation": "max"}), values.clone()), json!(10));
        assert_eq!(run(json!({"operation": "count"}), values), json!(3));
    }

    #[test]
    fn test_merge_objects() {
        let out = run(
            json!({"aggregateOperation": "merge"}),
            vec![json!({"a": 1, "b": 1}), json!("skip"), json!({"b": 2})],
        );
        assert_eq!(out, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_unknown_collects() {
        let out = run(json!({"aggregateOperation": "zip"}), vec![json!(1), Value::Null, json!("x")]);
        assert_eq!(out, json!([1, "x"]));
    }
}
