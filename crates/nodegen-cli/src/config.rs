//! CLI configuration file
//!
//! One JSON document holding the provider settings at the top level and
//! engine settings under `engine`:
//!
//! ```json
//! {
//!   "openrouter": { "apiKey": "sk-..." },
//!   "github": { "token": "ghp_..." },
//!   "engine": { "capabilityTimeoutSecs": 60 }
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use node_engine::EngineConfig;
use nodegen_providers::ProviderConfig;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Read `path` when given, then apply environment overrides
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            providers: self.providers.with_env_overrides(),
            engine: self.engine.with_env_overrides(),
        }
    }
}
