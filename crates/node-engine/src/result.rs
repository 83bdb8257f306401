//! Run trace and result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NodeEngineError;
use crate::types::{NodeId, NodeKind};

/// One evaluated node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    pub node_id: NodeId,
    pub node_type: NodeKind,
    /// Input values after template resolution, keyed by port
    pub input: Value,
    /// Produced value; null when the node failed
    pub output: Value,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
    Cancelled,
}

/// Why a run did not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFailure {
    /// Offending node, when the failure belongs to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    pub message: String,
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub execution_id: String,
    pub success: bool,
    pub status: RunStatus,
    /// Output of the designated output node, or null
    pub result: Value,
    /// Evaluated nodes, in evaluation order
    pub steps: Vec<ExecutionStep>,
    /// Handle to continue with the same variables
    pub context_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionFailure>,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn completed(execution_id: String, context_id: String, result: Value, steps: Vec<ExecutionStep>) -> Self {
        Self {
            execution_id,
            success: true,
            status: RunStatus::Completed,
            result,
            steps,
            context_id,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failed(
        execution_id: String,
        context_id: String,
        node_id: Option<NodeId>,
        error: &NodeEngineError,
        steps: Vec<ExecutionStep>,
    ) -> Self {
        Self {
            execution_id,
            success: false,
            status: RunStatus::Failed,
            result: Value::Null,
            steps,
            context_id,
            error: Some(ExecutionFailure {
                node_id,
                message: error.to_string(),
            }),
        }
    }

    /// Create a cancelled result
    pub fn cancelled(execution_id: String, context_id: String, steps: Vec<ExecutionStep>) -> Self {
        Self {
            execution_id,
            success: false,
            status: RunStatus::Cancelled,
            result: Value::Null,
            steps,
            context_id,
            error: Some(ExecutionFailure {
                node_id: None,
                message: NodeEngineError::Cancelled.to_string(),
            }),
        }
    }

    /// Node blamed for a failure
    pub fn failed_node(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.node_id.as_deref())
    }

    /// Step recorded for `node_id`
    pub fn step(&self, node_id: &str) -> Option<&ExecutionStep> {
        self.steps.iter().find(|s| s.node_id == node_id)
    }
}
