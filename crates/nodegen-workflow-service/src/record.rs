//! Persisted run history

use chrono::{DateTime, Utc};
use node_engine::{ExecutionResult, ExecutionStep, RunStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One finished run of a stored workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: String,
    pub workflow_id: String,
    /// Opaque identity of whoever started the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,
    pub status: RunStatus,
    pub steps: Vec<ExecutionStep>,
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
    /// Context the run used; pass it back to continue with the same variables
    pub context_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ExecutionRecord {
    /// Build a record from an engine result
    pub fn from_result(
        workflow_id: impl Into<String>,
        caller_id: Option<String>,
        started_at: DateTime<Utc>,
        result: &ExecutionResult,
    ) -> Self {
        Self {
            id: result.execution_id.clone(),
            workflow_id: workflow_id.into(),
            caller_id,
            status: result.status,
            steps: result.steps.clone(),
            result: result.result.clone(),
            error: result.error.as_ref().map(|e| match &e.node_id {
                Some(node_id) => format!("{} (node '{}')", e.message, node_id),
                None => e.message.clone(),
            }),
            context_id: result.context_id.clone(),
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
