//! Provider configuration
//!
//! Read from a JSON file, then overridden from the environment so that
//! secrets never have to live on disk.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::Result;

/// Default OpenRouter endpoint
pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

/// Default GitHub REST endpoint
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Settings for every provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

impl ProviderConfig {
    /// Load from `path`; a missing file yields the defaults
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No provider config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply `OPENROUTER_*` and `GITHUB_*` environment variables
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = env_value("OPENROUTER_API_KEY") {
            self.openrouter.api_key = Some(key);
        }
        if let Some(url) = env_value("OPENROUTER_BASE_URL") {
            self.openrouter.base_url = url;
        }
        if let Some(token) = env_value("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(url) = env_value("GITHUB_API_URL") {
            self.github.api_url = url;
        }
        self
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// OpenRouter chat completion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRouterConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openrouter_url")]
    pub base_url: String,
    /// Sent as `HTTP-Referer` for OpenRouter's app attribution
    #[serde(default)]
    pub referer: String,
    /// Sent as `X-Title`
    #[serde(default = "default_app_title")]
    pub app_title: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_openrouter_url() -> String {
    DEFAULT_OPENROUTER_URL.to_string()
}

fn default_app_title() -> String {
    "NodeGen Studio".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openrouter_url(),
            referer: String::new(),
            app_title: default_app_title(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// GitHub repository access settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// GitHub rejects requests without a user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_github_api_url() -> String {
    DEFAULT_GITHUB_API_URL.to_string()
}

fn default_user_agent() -> String {
    "nodegen-studio".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_api_url(),
            user_agent: default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"openrouter": {"apiKey": "sk-test", "maxTokens": 500}}"#).unwrap();

        assert_eq!(config.openrouter.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openrouter.max_tokens, 500);
        assert_eq!(config.openrouter.base_url, DEFAULT_OPENROUTER_URL);
        assert_eq!(config.openrouter.app_title, "NodeGen Studio");
        assert_eq!(config.github, GitHubConfig::default());
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProviderConfig::load(&dir.path().join("providers.json"))
            .await
            .unwrap();
        assert_eq!(config, ProviderConfig::default());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.json");
        std::fs::write(&path, r#"{"github": {"token": "ghp_x", "apiUrl": "http://localhost:9"}}"#).unwrap();

        let config = ProviderConfig::load(&path).await.unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_x"));
        assert_eq!(config.github.api_url, "http://localhost:9");
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(ProviderConfig::load(&path).await.is_err());
    }
}
