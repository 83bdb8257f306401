//! Repository source node
//!
//! Reads `githubRepo` (`owner/repo`), `githubBranch`, `githubPath`,
//! `githubSearchQuery` and `githubMode` from node data. Misconfiguration
//! yields a bracketed marker string instead of an error; fetch failures
//! are errors.

use serde_json::Value;

use crate::capabilities::{RepositoryMode, RepositoryRequest};
use crate::constants::defaults;
use crate::error::Result;
use crate::nodes::{NodeConfig, NodeRuntime};
use crate::types::GraphNode;

/// Why a repository node could not build a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryConfigError {
    MissingRepository,
    InvalidRepository(String),
    MissingPath,
    MissingQuery,
    UnknownMode(String),
}

impl std::fmt::Display for RepositoryConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRepository => write!(f, "[Repository: not configured]"),
            Self::InvalidRepository(repo) => {
                write!(f, "[Repository: invalid repository format: {}]", repo)
            }
            Self::MissingPath => write!(f, "[Repository: file path not specified]"),
            Self::MissingQuery => write!(f, "[Repository: search query not specified]"),
            Self::UnknownMode(mode) => write!(f, "[Repository: unknown mode: {}]", mode),
        }
    }
}

/// Split `owner/repo`, trimming both halves
pub fn parse_repository(repo: &str) -> std::result::Result<(String, String), RepositoryConfigError> {
    let parts: Vec<&str> = repo.split('/').map(str::trim).collect();
    match parts.as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(RepositoryConfigError::InvalidRepository(repo.to_string())),
    }
}

struct RepositorySettings {
    repo: String,
    branch: String,
    path: String,
    request: RepositoryRequest,
}

fn settings(node: &GraphNode) -> std::result::Result<RepositorySettings, RepositoryConfigError> {
    let config = NodeConfig::new(&node.data);
    let repo = config
        .text("githubRepo")
        .ok_or(RepositoryConfigError::MissingRepository)?;
    let (owner, name) = parse_repository(&repo)?;
    let branch = config.text_or("githubBranch", defaults::BRANCH);
    let path = config.text_or("githubPath", "");
    let mode_name = config.text_or("githubMode", "list");

    let mode = RepositoryMode::parse(&mode_name)
        .ok_or_else(|| RepositoryConfigError::UnknownMode(mode_name.clone()))?;
    let path_or_query = match mode {
        RepositoryMode::List => path.clone(),
        RepositoryMode::Read if path.is_empty() => return Err(RepositoryConfigError::MissingPath),
        RepositoryMode::Read => path.clone(),
        RepositoryMode::Search => config
            .text("githubSearchQuery")
            .ok_or(RepositoryConfigError::MissingQuery)?,
    };

    Ok(RepositorySettings {
        repo,
        branch: branch.clone(),
        path,
        request: RepositoryRequest {
            owner,
            repo: name,
            reference: branch,
            mode,
            path_or_query,
        },
    })
}

/// Fetch and frame repository content
pub async fn repository_source(node: &GraphNode, runtime: &NodeRuntime<'_>) -> Result<Value> {
    let settings = match settings(node) {
        Ok(settings) => settings,
        Err(marker) => {
            log::warn!("Repository node '{}' misconfigured: {}", node.id, marker);
            return Ok(Value::String(marker.to_string()));
        }
    };

    let request = &settings.request;
    log::debug!(
        "Fetching {:?} from {}/{}@{}",
        request.mode,
        request.owner,
        request.repo,
        request.reference
    );
    let body = runtime
        .call(
            "repository source",
            runtime.capabilities.repository.fetch_repository_source(request),
        )
        .await?;

    let framed = match request.mode {
        RepositoryMode::List => {
            let path_line = if settings.path.is_empty() {
                String::new()
            } else {
                format!("Path: {}\n", settings.path)
            };
            format!(
                "# Files in repository {} ({})\n{}\n{}",
                settings.repo, settings.branch, path_line, body
            )
        }
        RepositoryMode::Read => format!("# File content: {}\n```\n{}\n```", settings.path, body),
        RepositoryMode::Search => {
            format!("# Search results: \"{}\"\n{}", request.path_or_query, body)
        }
    };
    Ok(Value::String(framed))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::capabilities::{Capabilities, ChatCompletion, ChatMessage, RepositorySource};
    use crate::error::NodeEngineError;
    use crate::nodes::test_support::node;
    use crate::types::NodeKind;

    #[derive(Default)]
    struct RecordingRepository {
        requests: Mutex<Vec<RepositoryRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl RepositorySource for RecordingRepository {
        async fn fetch_repository_source(&self, request: &RepositoryRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(NodeEngineError::capability("not found"));
            }
            Ok(match request.mode {
                RepositoryMode::List => "- 📄 README.md".to_string(),
                RepositoryMode::Read => "fn main() {}".to_string(),
                RepositoryMode::Search => "Found 1 result(s):\n\n- src/lib.rs".to_string(),
            })
        }
    }

    struct NoChat;

    #[async_trait]
    impl ChatCompletion for NoChat {
        async fn complete_chat(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String> {
            Ok(String::new())
        }
    }

    async fn run(data: serde_json::Value, repo: Arc<RecordingRepository>) -> Result<Value> {
        let caps = Capabilities::new(Arc::new(NoChat), repo);
        let runtime = NodeRuntime {
            capabilities: &caps,
            capability_timeout: None,
        };
        repository_source(&node(NodeKind::RepositorySource, data), &runtime).await
    }

    #[test]
    fn test_parse_repository() {
        assert_eq!(
            parse_repository(" rust-lang / rust "),
            Ok(("rust-lang".to_string(), "rust".to_string()))
        );
        assert!(parse_repository("just-a-name").is_err());
        assert!(parse_repository("a/b/c").is_err());
        assert!(parse_repository("/b").is_err());
    }

    #[tokio::test]
    async fn test_config_errors_become_markers() {
        let repo = Arc::new(RecordingRepository::default());

        let missing = run(json!({}), repo.clone()).await.unwrap();
        assert_eq!(missing, json!("[Repository: not configured]"));

        let invalid = run(json!({"githubRepo": "nope"}), repo.clone()).await.unwrap();
        assert_eq!(invalid, json!("[Repository: invalid repository format: nope]"));

        let no_path = run(json!({"githubRepo": "a/b", "githubMode": "read"}), repo.clone())
            .await
            .unwrap();
        assert_eq!(no_path, json!("[Repository: file path not specified]"));

        let no_query = run(json!({"githubRepo": "a/b", "githubMode": "search"}), repo.clone())
            .await
            .unwrap();
        assert_eq!(no_query, json!("[Repository: search query not specified]"));

        let bad_mode = run(json!({"githubRepo": "a/b", "githubMode": "clone"}), repo.clone())
            .await
            .unwrap();
        assert_eq!(bad_mode, json!("[Repository: unknown mode: clone]"));

        assert!(repo.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_defaults_to_main_branch() {
        let repo = Arc::new(RecordingRepository::default());
        let out = run(json!({"githubRepo": "acme/widgets"}), repo.clone()).await.unwrap();

        assert_eq!(out, json!("# Files in repository acme/widgets (main)\n\n- 📄 README.md"));
        let requests = repo.requests.lock().unwrap();
        assert_eq!(requests[0].owner, "acme");
        assert_eq!(requests[0].repo, "widgets");
        assert_eq!(requests[0].reference, "main");
        assert_eq!(requests[0].mode, RepositoryMode::List);
    }

    #[tokio::test]
    async fn test_read_and_search_framing() {
        let repo = Arc::new(RecordingRepository::default());
        let read = run(
            json!({"githubRepo": "acme/widgets", "githubMode": "read", "githubPath": "src/main.rs", "githubBranch": "dev"}),
            repo.clone(),
        )
        .await
        .unwrap();
        assert_eq!(read, json!("# File content: src/main.rs\n```\nfn main() {}\n```"));

        let search = run(
            json!({"githubRepo": "acme/widgets", "githubMode": "search", "githubSearchQuery": "parse"}),
            repo.clone(),
        )
        .await
        .unwrap();
        assert_eq!(
            search,
            json!("# Search results: \"parse\"\nFound 1 result(s):\n\n- src/lib.rs")
        );
        assert_eq!(repo.requests.lock().unwrap()[0].reference, "dev");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_error() {
        let repo = Arc::new(RecordingRepository {
            fail: true,
            ..Default::default()
        });
        let result = run(json!({"githubRepo": "acme/widgets"}), repo).await;
        assert!(matches!(result, Err(NodeEngineError::Capability(_))));
    }
}
