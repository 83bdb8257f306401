//! External capabilities the host supplies to the engine
//!
//! Evaluators that need the outside world go through these two traits.
//! They are the only places a run suspends on I/O.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{NodeEngineError, Result};

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Chat completion against a hosted model
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send `messages` to `model` and return the reply text.
    ///
    /// Must fail on any non-success response, with the body as detail.
    async fn complete_chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// What to fetch from a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryMode {
    /// Directory listing at a path
    List,
    /// Raw text of one file
    Read,
    /// Code search within the repository
    Search,
}

impl RepositoryMode {
    /// Parse a configured mode name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "list" => Some(Self::List),
            "read" => Some(Self::Read),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

/// A repository fetch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRequest {
    pub owner: String,
    pub repo: String,
    /// Branch, tag or commit
    pub reference: String,
    pub mode: RepositoryMode,
    /// Directory or file path for list/read; query for search
    pub path_or_query: String,
}

/// Read access to a source-code repository host
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Fetch a listing, file text, or search summary as text.
    ///
    /// Must fail on not-found and unauthorized responses.
    async fn fetch_repository_source(&self, request: &RepositoryRequest) -> Result<String>;
}

/// Capability set used for one engine
#[derive(Clone)]
pub struct Capabilities {
    pub chat: Arc<dyn ChatCompletion>,
    pub repository: Arc<dyn RepositorySource>,
}

impl Capabilities {
    pub fn new(chat: Arc<dyn ChatCompletion>, repository: Arc<dyn RepositorySource>) -> Self {
        Self { chat, repository }
    }

    /// Capabilities that fail every call; for graphs with no external nodes
    pub fn unavailable() -> Self {
        Self {
            chat: Arc::new(Unavailable),
            repository: Arc::new(Unavailable),
        }
    }
}

struct Unavailable;

#[async_trait]
impl ChatCompletion for Unavailable {
    async fn complete_chat(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String> {
        Err(NodeEngineError::capability("no chat completion provider configured"))
    }
}

#[async_trait]
impl RepositorySource for Unavailable {
    async fn fetch_repository_source(&self, _request: &RepositoryRequest) -> Result<String> {
        Err(NodeEngineError::capability("no repository provider configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_mode_parse() {
        assert_eq!(RepositoryMode::parse("list"), Some(RepositoryMode::List));
        assert_eq!(RepositoryMode::parse("search"), Some(RepositoryMode::Search));
        assert_eq!(RepositoryMode::parse("clone"), None);
    }

    #[test]
    fn test_chat_message_wire_shape() {
        let msg = ChatMessage::user("hello");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({"role": "user", "content": "hello"})
        );
    }

    #[tokio::test]
    async fn test_unavailable_capabilities_fail() {
        let caps = Capabilities::unavailable();
        let err = caps
            .chat
            .complete_chat("m", &[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, NodeEngineError::Capability(_)));
    }
}
