//! Node evaluators
//!
//! One evaluation function per [`NodeKind`], selected by an exhaustive
//! match in [`evaluate`]. Evaluators receive the node's resolved input
//! values, its configuration and the execution context, and produce a
//! single output value.
//!
//! Configuration mistakes never fail a node: they surface as marker
//! strings flowing downstream. Only capability failures (and timeouts)
//! are returned as errors.

pub mod control;
pub mod input;
pub mod output;
pub mod processing;

mod config;

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::capabilities::Capabilities;
use crate::context::ExecutionContext;
use crate::error::{NodeEngineError, Result};
use crate::types::{GraphNode, NodeKind, PortId};

pub(crate) use config::NodeConfig;

/// Values delivered to a node's input ports.
///
/// Ports keep the order in which they first received a value; a later
/// value for the same port replaces the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortValues {
    entries: Vec<(PortId, Value)>,
}

impl PortValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for a port; last write wins
    pub fn insert(&mut self, port: impl Into<PortId>, value: Value) {
        let port = port.into();
        match self.entries.iter_mut().find(|(p, _)| *p == port) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((port, value)),
        }
    }

    pub fn get(&self, port: &str) -> Option<&Value> {
        self.entries.iter().find(|(p, _)| p == port).map(|(_, v)| v)
    }

    /// Value of the first port to receive one
    pub fn first(&self) -> Option<&Value> {
        self.entries.first().map(|(_, v)| v)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot as a JSON object keyed by port
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(p, v)| (p.clone(), v.clone()))
                .collect(),
        )
    }
}

impl<P: Into<PortId>> FromIterator<(P, Value)> for PortValues {
    fn from_iter<I: IntoIterator<Item = (P, Value)>>(iter: I) -> Self {
        let mut values = PortValues::new();
        for (port, value) in iter {
            values.insert(port, value);
        }
        values
    }
}

/// Host resources available to evaluators during a run
pub struct NodeRuntime<'a> {
    pub capabilities: &'a Capabilities,
    /// Bound on each capability call; `None` waits indefinitely
    pub capability_timeout: Option<Duration>,
}

impl NodeRuntime<'_> {
    /// Await a capability call under the configured timeout
    pub(crate) async fn call<T, F>(&self, capability: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.capability_timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| NodeEngineError::Timeout {
                    capability,
                    timeout,
                })?,
            None => call.await,
        }
    }
}

/// Evaluate one node
pub async fn evaluate(
    node: &GraphNode,
    inputs: &PortValues,
    context: &mut ExecutionContext,
    runtime: &NodeRuntime<'_>,
) -> Result<Value> {
    match node.kind {
        NodeKind::TextInput => Ok(input::text_input(node)),
        NodeKind::RepositorySource => input::repository_source(node, runtime).await,
        NodeKind::LlmProcessor => processing::llm_processor(node, inputs, runtime).await,
        NodeKind::Transform => Ok(processing::transform(node, inputs)),
        NodeKind::Conditional => Ok(control::conditional(node, inputs, context)),
        NodeKind::Variable => Ok(control::variable(node, inputs, context)),
        NodeKind::Loop => Ok(control::loop_items(node, inputs)),
        NodeKind::Aggregate => Ok(control::aggregate(node, inputs)),
        NodeKind::OutputSink => Ok(output::output_sink(inputs)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::Value;

    use crate::types::{GraphNode, NodeKind};

    /// A node of `kind` with the given JSON object as data
    pub fn node(kind: NodeKind, data: Value) -> GraphNode {
        let mut node = GraphNode::new("n1", kind);
        if let Value::Object(map) = data {
            node.data = map;
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_port_values_last_write_keeps_position() {
        let mut values = PortValues::new();
        values.insert("a", json!(1));
        values.insert("b", json!(2));
        values.insert("a", json!(3));

        assert_eq!(values.len(), 2);
        assert_eq!(values.first(), Some(&json!(3)));
        assert_eq!(values.get("b"), Some(&json!(2)));
        assert_eq!(values.to_json(), json!({"a": 3, "b": 2}));
    }

    #[tokio::test]
    async fn test_capability_timeout() {
        let caps = Capabilities::unavailable();
        let runtime = NodeRuntime {
            capabilities: &caps,
            capability_timeout: Some(Duration::from_millis(10)),
        };
        let result: Result<()> = runtime
            .call("chat", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(NodeEngineError::Timeout { capability: "chat", .. })
        ));
    }
}
