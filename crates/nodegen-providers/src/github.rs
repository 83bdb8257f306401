//! GitHub repository source
//!
//! Uses the REST contents and code search endpoints. Listings and search
//! hits are rendered as markdown-style bullet lists for prompt use.

use async_trait::async_trait;
use base64::Engine;
use node_engine::{RepositoryMode, RepositoryRequest, RepositorySource};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::GitHubConfig;
use crate::error::{ProviderError, Result};

const SERVICE: &str = "GitHub";

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type")]
    pub kind: String,
}

impl ContentEntry {
    fn is_dir(&self) -> bool {
        self.kind == "dir"
    }
}

/// Contents endpoint answers with an array for directories, an object for files
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentEntry>),
    Single(FileContent),
}

/// A file fetched through the contents endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    path: String,
}

/// Authenticated GitHub account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Client for the GitHub REST API
pub struct GitHubClient {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn token(&self) -> Result<&str> {
        self.config
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ProviderError::MissingCredentials("GitHub token"))
    }

    /// GET `path` (relative to the API root) and decode the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let token = self.token()?;
        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), path);
        log::debug!("GitHub request: GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                404 => ProviderError::NotFound(path.to_string()),
                401 | 403 => ProviderError::Unauthorized(body),
                code => ProviderError::Api {
                    service: SERVICE,
                    status: code,
                    body,
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse GitHub response: {}", e)))
    }

    fn contents_path(owner: &str, repo: &str, path: &str) -> String {
        format!("repos/{}/{}/contents/{}", owner, repo, path.trim_start_matches('/'))
    }

    /// Entries under `path` (repository root when empty)
    pub async fn list_files(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Result<Vec<ContentEntry>> {
        let response: ContentsResponse = self
            .get_json(&Self::contents_path(owner, repo, path), &[("ref", reference)])
            .await?;

        Ok(match response {
            ContentsResponse::Listing(entries) => entries,
            ContentsResponse::Single(file) => vec![ContentEntry {
                name: file.name,
                path: file.path,
                kind: file.kind,
            }],
        })
    }

    /// Decoded text of the file at `path`
    pub async fn read_file(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Result<String> {
        let response: ContentsResponse = self
            .get_json(&Self::contents_path(owner, repo, path), &[("ref", reference)])
            .await?;

        let file = match response {
            ContentsResponse::Single(file) if file.kind == "file" => file,
            _ => {
                return Err(ProviderError::InvalidResponse(format!(
                    "Path is not a file: {}",
                    path
                )))
            }
        };
        decode_content(&file)
    }

    /// Code search restricted to `owner/repo`; returns the total count and hit paths
    pub async fn search_code(&self, owner: &str, repo: &str, query: &str) -> Result<(u64, Vec<String>)> {
        let q = format!("{} repo:{}/{}", query, owner, repo);
        let response: SearchResponse = self.get_json("search/code", &[("q", q.as_str())]).await?;
        Ok((
            response.total_count,
            response.items.into_iter().map(|item| item.path).collect(),
        ))
    }

    /// Account behind the configured token; fails when the token is rejected
    pub async fn current_user(&self) -> Result<GitHubUser> {
        self.get_json("user", &[]).await
    }
}

fn decode_content(file: &FileContent) -> Result<String> {
    let raw = file.content.as_deref().unwrap_or_default();
    match file.encoding.as_deref() {
        Some("base64") | None => {
            // GitHub wraps base64 content at 60 columns
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| ProviderError::InvalidResponse(format!("Invalid base64 content: {}", e)))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Some(_) => Ok(raw.to_string()),
    }
}

/// `- 📁 name` / `- 📄 name` lines
pub fn format_listing(entries: &[ContentEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("- {} {}", if entry.is_dir() { "📁" } else { "📄" }, entry.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `Found N result(s):` followed by one `- path` line per hit
pub fn format_search(total_count: u64, paths: &[String]) -> String {
    let lines: Vec<String> = paths.iter().map(|p| format!("- {}", p)).collect();
    format!("Found {} result(s):\n\n{}", total_count, lines.join("\n"))
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn fetch_repository_source(&self, request: &RepositoryRequest) -> node_engine::Result<String> {
        let RepositoryRequest {
            owner,
            repo,
            reference,
            mode,
            path_or_query,
        } = request;

        let text = match mode {
            RepositoryMode::List => format_listing(&self.list_files(owner, repo, path_or_query, reference).await?),
            RepositoryMode::Read => self.read_file(owner, repo, path_or_query, reference).await?,
            RepositoryMode::Search => {
                let (total, paths) = self.search_code(owner, repo, path_or_query).await?;
                format_search(total, &paths)
            }
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_mock;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn client(api_url: String) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            token: Some("ghp_test".to_string()),
            api_url,
            ..GitHubConfig::default()
        })
    }

    fn request(mode: RepositoryMode, path_or_query: &str) -> RepositoryRequest {
        RepositoryRequest {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            reference: "dev".to_string(),
            mode,
            path_or_query: path_or_query.to_string(),
        }
    }

    async fn contents(
        Path(path): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<Value>) {
        assert_eq!(headers["authorization"], "Bearer ghp_test");
        assert!(headers.contains_key("user-agent"));
        assert_eq!(query.get("ref").map(String::as_str), Some("dev"));
        match path.as_str() {
            "src" => (
                StatusCode::OK,
                Json(json!([
                    {"name": "lib", "path": "src/lib", "type": "dir"},
                    {"name": "main.rs", "path": "src/main.rs", "type": "file"}
                ])),
            ),
            "README.md" => (
                StatusCode::OK,
                // "Hello\nworld" wrapped like GitHub does
                Json(json!({
                    "name": "README.md", "path": "README.md", "type": "file", "size": 11,
                    "content": "SGVsbG8K\nd29ybGQ=\n", "encoding": "base64"
                })),
            ),
            _ => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))),
        }
    }

    async fn root_contents(headers: HeaderMap, query: Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        contents(Path("src".to_string()), query, headers).await
    }

    fn app() -> Router {
        Router::new()
            .route("/repos/acme/widgets/contents/", get(root_contents))
            .route("/repos/acme/widgets/contents/*path", get(contents))
            .route(
                "/search/code",
                get(|Query(query): Query<HashMap<String, String>>| async move {
                    assert_eq!(query["q"], "fn main repo:acme/widgets");
                    Json(json!({
                        "total_count": 2,
                        "items": [{"path": "src/main.rs"}, {"path": "examples/demo.rs"}]
                    }))
                }),
            )
            .route(
                "/user",
                get(|headers: HeaderMap| async move {
                    if headers["authorization"] == "Bearer ghp_test" {
                        (StatusCode::OK, Json(json!({"login": "octo", "name": "Octo Cat"})))
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"})))
                    }
                }),
            )
    }

    #[tokio::test]
    async fn test_list_formats_entries() {
        let github = client(spawn_mock(app()).await);
        let text = github
            .fetch_repository_source(&request(RepositoryMode::List, "src"))
            .await
            .unwrap();
        assert_eq!(text, "- 📁 lib\n- 📄 main.rs");
    }

    #[tokio::test]
    async fn test_list_repository_root() {
        let github = client(spawn_mock(app()).await);
        let entries = github.list_files("acme", "widgets", "", "dev").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_dir());
    }

    #[tokio::test]
    async fn test_read_decodes_base64() {
        let github = client(spawn_mock(app()).await);
        let text = github
            .fetch_repository_source(&request(RepositoryMode::Read, "README.md"))
            .await
            .unwrap();
        assert_eq!(text, "Hello\nworld");
    }

    #[tokio::test]
    async fn test_read_directory_is_not_a_file() {
        let github = client(spawn_mock(app()).await);
        let err = github.read_file("acme", "widgets", "src", "dev").await.unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let github = client(spawn_mock(app()).await);
        let err = github.list_files("acme", "widgets", "nope", "dev").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_scopes_query_to_repository() {
        let github = client(spawn_mock(app()).await);
        let text = github
            .fetch_repository_source(&request(RepositoryMode::Search, "fn main"))
            .await
            .unwrap();
        assert_eq!(text, "Found 2 result(s):\n\n- src/main.rs\n- examples/demo.rs");
    }

    #[tokio::test]
    async fn test_current_user_and_rejected_token() {
        let base = spawn_mock(app()).await;
        let user = client(base.clone()).current_user().await.unwrap();
        assert_eq!(user.login, "octo");

        let rejected = GitHubClient::new(GitHubConfig {
            token: Some("wrong".to_string()),
            api_url: base,
            ..GitHubConfig::default()
        });
        assert!(matches!(
            rejected.current_user().await,
            Err(ProviderError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_token_is_a_capability_error() {
        let github = GitHubClient::new(GitHubConfig::default());
        let err = github
            .fetch_repository_source(&request(RepositoryMode::List, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, node_engine::NodeEngineError::Capability(_)));
    }
}
