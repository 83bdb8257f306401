//! Hosted-service providers for the NodeGen engine
//!
//! Implements the engine's capability traits against real services:
//!
//! - `OpenRouterClient`: `ChatCompletion` over OpenRouter's chat API
//! - `GitHubClient`: `RepositorySource` over the GitHub REST API
//!
//! Both are configured through [`ProviderConfig`], which reads a JSON file
//! and then environment variables.

pub mod config;
pub mod error;
pub mod github;
pub mod openrouter;

use std::sync::Arc;

use node_engine::Capabilities;

pub use config::{GitHubConfig, OpenRouterConfig, ProviderConfig};
pub use error::{ProviderError, Result};
pub use github::GitHubClient;
pub use openrouter::{ApiKeyStatus, ModelInfo, OpenRouterClient};

/// Engine capabilities backed by OpenRouter and GitHub
pub fn capabilities(config: &ProviderConfig) -> Capabilities {
    Capabilities::new(
        Arc::new(OpenRouterClient::new(config.openrouter.clone())),
        Arc::new(GitHubClient::new(config.github.clone())),
    )
}
