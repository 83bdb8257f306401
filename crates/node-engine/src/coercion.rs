//! Permissive value coercion
//!
//! Evaluators never fail on a value of the "wrong" JSON type. Each
//! fallback they rely on is one of the named policies below.

use serde_json::Value;

/// Render a value as text.
///
/// Strings are returned as-is, null becomes the empty string, numbers and
/// booleans use their display form, arrays and objects are compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Convert a value to a number.
///
/// Booleans map to 1/0, null and blank strings to 0. Strings are parsed
/// after trimming; anything unparseable, arrays and objects become NaN.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::Bool(true) => 1.0,
        Value::Bool(false) | Value::Null => 0.0,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                parse_number(trimmed)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// [`to_number`] with NaN mapped to zero, for arithmetic aggregation
pub fn to_number_or_zero(value: &Value) -> f64 {
    let n = to_number(value);
    if n.is_nan() {
        0.0
    } else {
        n
    }
}

/// Falsy values: null, false, 0, NaN and the empty string.
///
/// Used for every "configured value or default" fallback.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Turn an f64 result back into a JSON number.
///
/// Integral results are emitted as integers so `3 + 4` yields `7`, not
/// `7.0`. Non-finite results have no JSON form and become null.
pub fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Value::from(n as i64);
    }
    Value::from(n)
}

/// Return `value` when truthy, otherwise `fallback`
pub fn or_default(value: Option<&Value>, fallback: Value) -> Value {
    match value {
        Some(v) if is_truthy(v) => v.clone(),
        _ => fallback,
    }
}

fn parse_number(s: &str) -> f64 {
    let lowered = s.to_ascii_lowercase();
    let (digits, radix) = if let Some(hex) = lowered.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = lowered.strip_prefix("0b") {
        (bin, 2)
    } else if let Some(oct) = lowered.strip_prefix("0o") {
        (oct, 8)
    } else {
        return match lowered.as_str() {
            "infinity" | "+infinity" => f64::INFINITY,
            "-infinity" => f64::NEG_INFINITY,
            // Rust accepts "inf" and "nan" spellings that are not numbers here
            "inf" | "+inf" | "-inf" | "nan" | "+nan" | "-nan" => f64::NAN,
            _ => s.parse::<f64>().unwrap_or(f64::NAN),
        };
    };
    u64::from_str_radix(digits, radix).map_or(f64::NAN, |n| n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&json!("abc")), "abc");
        assert_eq!(to_text(&Value::Null), "");
        assert_eq!(to_text(&json!(42)), "42");
        assert_eq!(to_text(&json!(true)), "true");
        assert_eq!(to_text(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_to_number_permissive() {
        assert_eq!(to_number(&json!("4")), 4.0);
        assert_eq!(to_number(&json!(" 2.5 ")), 2.5);
        assert_eq!(to_number(&json!("")), 0.0);
        assert_eq!(to_number(&Value::Null), 0.0);
        assert_eq!(to_number(&json!(true)), 1.0);
        assert_eq!(to_number(&json!("0x1f")), 31.0);
        assert!(to_number(&json!("abc")).is_nan());
        assert!(to_number(&json!("inf")).is_nan());
        assert!(to_number(&json!([1])).is_nan());
    }

    #[test]
    fn test_to_number_or_zero() {
        assert_eq!(to_number_or_zero(&json!("abc")), 0.0);
        assert_eq!(to_number_or_zero(&json!("7")), 7.0);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn test_number_value_prefers_integers() {
        assert_eq!(number_value(7.0), json!(7));
        assert_eq!(number_value(2.5), json!(2.5));
        assert_eq!(number_value(f64::NAN), Value::Null);
    }

    #[test]
    fn test_or_default() {
        assert_eq!(or_default(Some(&json!("")), json!("x")), json!("x"));
        assert_eq!(or_default(Some(&json!("y")), json!("x")), json!("y"));
        assert_eq!(or_default(None, json!(10)), json!(10));
    }
}
