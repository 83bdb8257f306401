//! Provider error types

use node_engine::NodeEngineError;

/// Result type alias using ProviderError
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors from the hosted services behind the engine's capabilities
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Request could not be sent or the response body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Resource does not exist (or is hidden from these credentials)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No credentials configured for the service
    #[error("{0} is not configured")]
    MissingCredentials(&'static str),

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<ProviderError> for NodeEngineError {
    fn from(error: ProviderError) -> Self {
        NodeEngineError::Capability(error.to_string())
    }
}
