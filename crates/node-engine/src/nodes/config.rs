//! Typed reads of node configuration
//!
//! Node data arrives either nested (`{"transformConfig": {"pattern": ..}}`)
//! or flattened by storage (`{"transformConfig.pattern": ..}`); dotted
//! keys are looked up both ways.

use serde_json::Value;

use crate::coercion::{is_truthy, to_number, to_text};
use crate::types::NodeData;

pub(crate) struct NodeConfig<'a> {
    data: &'a NodeData,
}

impl<'a> NodeConfig<'a> {
    pub fn new(data: &'a NodeData) -> Self {
        Self { data }
    }

    /// Raw value for `key`, flattened form first
    pub fn value(&self, key: &str) -> Option<&'a Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }
        let mut segments = key.split('.');
        let mut current = self.data.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Text for `key` when set to a truthy value
    pub fn text(&self, key: &str) -> Option<String> {
        self.value(key).filter(|v| is_truthy(v)).map(to_text)
    }

    /// Text for the first of `keys` that is set, or `default`
    pub fn text_any_or(&self, keys: &[&str], default: &str) -> String {
        keys.iter()
            .find_map(|key| self.text(key))
            .unwrap_or_else(|| default.to_string())
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    /// Positive count for `key` (numeric strings accepted), or `default`
    pub fn count_or(&self, key: &str, default: usize) -> usize {
        let n = self.value(key).map(to_number).unwrap_or(f64::NAN);
        if n.is_finite() && n >= 1.0 {
            n.floor() as usize
        } else {
            default
        }
    }
}
