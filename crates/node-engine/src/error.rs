//! Error types for the node engine

use std::time::Duration;

use thiserror::Error;

/// Result type alias using NodeEngineError
pub type Result<T> = std::result::Result<T, NodeEngineError>;

/// Errors that can occur in the node engine
#[derive(Debug, Error)]
pub enum NodeEngineError {
    /// Node evaluation failed
    #[error("Node execution failed: {0}")]
    ExecutionFailed(String),

    /// An external capability (chat completion, repository source) failed
    #[error("Capability error: {0}")]
    Capability(String),

    /// An external capability did not answer in time
    #[error("{capability} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        capability: &'static str,
        timeout: Duration,
    },

    /// A node referenced by the graph does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The graph contains a dependency cycle reachable during evaluation
    #[error("Dependency cycle detected at node '{0}'")]
    CycleDetected(String),

    /// No execution context is registered under the handle
    #[error("Execution context not found: {0}")]
    ContextNotFound(String),

    /// The execution context is leased by another run
    #[error("Execution context is busy: {0}")]
    ContextBusy(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Workflow was cancelled
    #[error("Workflow cancelled")]
    Cancelled,
}

impl NodeEngineError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a capability error with a message
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }
}
