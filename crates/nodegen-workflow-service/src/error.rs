//! Service error types

use node_engine::ValidationSummary;

/// Result type alias using ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors raised by the workflow service and its stores
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    /// The graph failed validation and was not run
    #[error("Workflow is invalid: {}", .0.errors.join("; "))]
    InvalidWorkflow(ValidationSummary),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Engine error: {0}")]
    Engine(#[from] node_engine::NodeEngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
