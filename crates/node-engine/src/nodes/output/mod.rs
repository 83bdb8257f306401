//! Output node

use serde_json::Value;

use crate::nodes::PortValues;

/// Pass the first input through unchanged; null when nothing is connected
pub fn output_sink(inputs: &PortValues) -> Value {
    inputs.first().cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_is_identity() {
        let inputs: PortValues = [("input", json!({"x": [1, 2]}))].into_iter().collect();
        assert_eq!(output_sink(&inputs), json!({"x": [1, 2]}));
        assert_eq!(output_sink(&PortValues::new()), Value::Null);
    }
}
