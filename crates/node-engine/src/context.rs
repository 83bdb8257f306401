//! Execution context and template resolution
//!
//! An [`ExecutionContext`] holds the variables a run can read and write:
//! workflow-scoped globals and per-node locals. It is an explicit value
//! owned by the caller, passed by `&mut` through a run and kept (or
//! dropped) afterwards. [`crate::ContextStore`] keeps contexts alive
//! between chained runs under an opaque handle.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coercion::to_text;
use crate::types::NodeId;

/// Variables visible to a node, by name
pub type Variables = HashMap<String, Value>;

const PLACEHOLDER_PATTERN: &str = r"\{\{(\w+)\}\}";

/// Mutable per-run variable state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    id: String,
    workflow_id: String,
    global_variables: Variables,
    node_variables: HashMap<NodeId, Variables>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Create an empty context with a fresh handle
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self::with_id(format!("ctx_{}", uuid::Uuid::new_v4()), workflow_id)
    }

    /// Create an empty context under a known handle
    pub fn with_id(id: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            workflow_id: workflow_id.into(),
            global_variables: Variables::new(),
            node_variables: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Opaque handle of this context
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Set a workflow-scoped variable
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.global_variables.insert(name.into(), value);
        self.updated_at = Utc::now();
    }

    /// Get a workflow-scoped variable
    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.global_variables.get(name)
    }

    /// Set a variable visible only to one node
    pub fn set_node_local(&mut self, node_id: impl Into<NodeId>, name: impl Into<String>, value: Value) {
        self.node_variables
            .entry(node_id.into())
            .or_default()
            .insert(name.into(), value);
        self.updated_at = Utc::now();
    }

    /// Get a variable local to one node
    pub fn get_node_local(&self, node_id: &str, name: &str) -> Option<&Value> {
        self.node_variables.get(node_id).and_then(|vars| vars.get(name))
    }

    /// All workflow-scoped variables
    pub fn globals(&self) -> &Variables {
        &self.global_variables
    }

    /// Globals overlaid with the node's locals; locals win on collision
    pub fn available_variables(&self, node_id: Option<&str>) -> Variables {
        let mut variables = self.global_variables.clone();
        if let Some(locals) = node_id.and_then(|id| self.node_variables.get(id)) {
            for (name, value) in locals {
                variables.insert(name.clone(), value.clone());
            }
        }
        variables
    }

    /// Resolve `{{name}}` placeholders against what `node_id` can see
    pub fn resolve_for(&self, node_id: &str, text: &str) -> String {
        resolve_template(text, &self.available_variables(Some(node_id)))
    }
}

fn placeholder() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).ok())
        .as_ref()
}

/// Replace every `{{identifier}}` with the stringified variable value.
///
/// Placeholders naming an absent (or null) variable are left verbatim,
/// so resolving twice with the same variables changes nothing.
pub fn resolve_template(text: &str, variables: &Variables) -> String {
    let Some(pattern) = placeholder() else {
        return text.to_string();
    };
    if !text.contains("{{") {
        return text.to_string();
    }

    pattern
        .replace_all(text, |caps: &Captures<'_>| match variables.get(&caps[1]) {
            Some(value) if !value.is_null() => to_text(value),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, Value)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_resolve_template_substitutes_known_names() {
        let variables = vars(&[("name", json!("Ada")), ("count", json!(3))]);
        assert_eq!(
            resolve_template("Hi {{name}}, you have {{count}} items", &variables),
            "Hi Ada, you have 3 items"
        );
    }

    #[test]
    fn test_resolve_template_leaves_missing_placeholders() {
        let variables = vars(&[("known", json!("x")), ("nothing", Value::Null)]);
        let text = "{{missing}} and {{nothing}} and {{ spaced }}";
        assert_eq!(resolve_template(text, &variables), text);
    }

    #[test]
    fn test_resolve_template_is_idempotent() {
        let variables = vars(&[("a", json!("1")), ("obj", json!({"k": true}))]);
        let text = "{{a}}-{{b}}-{{obj}}";
        let once = resolve_template(text, &variables);
        let twice = resolve_template(&once, &variables);
        assert_eq!(once, r#"1-{{b}}-{"k":true}"#);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_available_variables_node_local_wins() {
        let mut ctx = ExecutionContext::new("wf");
        ctx.set_global("topic", json!("rust"));
        ctx.set_global("lang", json!("en"));
        ctx.set_node_local("n1", "topic", json!("go"));

        let for_node = ctx.available_variables(Some("n1"));
        assert_eq!(for_node["topic"], json!("go"));
        assert_eq!(for_node["lang"], json!("en"));

        let global_only = ctx.available_variables(None);
        assert_eq!(global_only["topic"], json!("rust"));

        let other = ctx.available_variables(Some("n2"));
        assert_eq!(other["topic"], json!("rust"));
    }

    #[test]
    fn test_context_handles_are_unique() {
        let a = ExecutionContext::new("wf");
        let b = ExecutionContext::new("wf");
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("ctx_"));
    }

    #[test]
    fn test_resolve_for_node() {
        let mut ctx = ExecutionContext::new("wf");
        ctx.set_node_local("n1", "who", json!("node"));
        assert_eq!(ctx.resolve_for("n1", "{{who}}"), "node");
        assert_eq!(ctx.resolve_for("n2", "{{who}}"), "{{who}}");
        assert_eq!(ctx.get_node_local("n1", "who"), Some(&json!("node")));
        assert_eq!(ctx.get_global("who"), None);
    }
}
