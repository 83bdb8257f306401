//! OpenRouter chat completion client
//!
//! OpenRouter exposes an OpenAI-compatible API, so a single user message
//! is posted to `/chat/completions` and the first choice is returned.

use async_trait::async_trait;
use node_engine::{ChatCompletion, ChatMessage};
use serde::{Deserialize, Serialize};

use crate::config::OpenRouterConfig;
use crate::error::{ProviderError, Result};

const SERVICE: &str = "OpenRouter";

/// Reply used when the completion has no text
const EMPTY_REPLY: &str = "No response";

/// Models offered in the editor's model picker
pub const CURATED_MODELS: &[(&str, &str)] = &[
    ("GLM-4.5 Air (Free)", "z-ai/glm-4.5-air:free"),
    (
        "Google Gemini 2.5 Flash Preview (Free)",
        "google/gemini-2.5-flash-preview-09-2025",
    ),
    ("Qwen 3 4B (Free)", "qwen/qwen3-4b:free"),
];

/// Whether `model_id` is one of [`CURATED_MODELS`]
pub fn is_curated_model(model_id: &str) -> bool {
    CURATED_MODELS.iter().any(|(_, id)| *id == model_id)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// A model listed by OpenRouter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "context_length")]
    pub context_length: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelInfo>,
}

/// Outcome of an API key check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyStatus {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Client for OpenRouter's OpenAI-compatible API
pub struct OpenRouterClient {
    config: OpenRouterConfig,
    http_client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingCredentials("OpenRouter API key"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Add authentication and attribution headers
    fn authorized(&self, request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
        request
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.app_title)
    }

    /// Send `messages` to `model` and return the first choice's text
    pub async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self.api_key()?;
        let body = ChatRequest {
            model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        log::debug!("OpenRouter chat request: model={}, messages={}", model, messages.len());
        let response = self
            .authorized(self.http_client.post(self.url("chat/completions")), api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse completion: {}", e)))?;

        Ok(reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }

    /// List models visible to the configured key
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let api_key = self.api_key()?;
        let response = self
            .authorized(self.http_client.get(self.url("models")), api_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::Unauthorized("Invalid API key".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse models: {}", e)))?;
        Ok(models.data)
    }

    /// Check the configured key by listing models
    pub async fn validate_api_key(&self) -> ApiKeyStatus {
        match self.list_models().await {
            Ok(models) => ApiKeyStatus {
                valid: true,
                models: Some(models),
                error: None,
            },
            Err(e) => {
                log::warn!("OpenRouter API key check failed: {}", e);
                ApiKeyStatus {
                    valid: false,
                    models: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenRouterClient {
    async fn complete_chat(&self, model: &str, messages: &[ChatMessage]) -> node_engine::Result<String> {
        Ok(self.chat(model, messages).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_mock;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn client(base_url: String, api_key: Option<&str>) -> OpenRouterClient {
        OpenRouterClient::new(OpenRouterConfig {
            api_key: api_key.map(str::to_string),
            base_url,
            ..OpenRouterConfig::default()
        })
    }

    async fn echo_completion(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(headers["x-title"], "NodeGen Studio");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "user");
        let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": format!("echo: {}", prompt)}}]
        }))
    }

    #[tokio::test]
    async fn test_chat_returns_first_choice() {
        let app = Router::new().route("/chat/completions", post(echo_completion));
        let base = spawn_mock(app).await;

        let reply = client(base, Some("sk-test"))
            .complete_chat("z-ai/glm-4.5-air:free", &[ChatMessage::user("Hello")])
            .await
            .unwrap();
        assert_eq!(reply, "echo: Hello");
    }

    #[tokio::test]
    async fn test_empty_choices_gives_placeholder() {
        let app = Router::new().route("/chat/completions", post(|| async { Json(json!({"choices": []})) }));
        let base = spawn_mock(app).await;

        let reply = client(base, Some("sk-test"))
            .chat("m", &[ChatMessage::user("x")])
            .await
            .unwrap();
        assert_eq!(reply, "No response");
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::PAYMENT_REQUIRED, "insufficient credits") }),
        );
        let base = spawn_mock(app).await;

        let err = client(base, Some("sk-test"))
            .chat("m", &[ChatMessage::user("x")])
            .await
            .unwrap_err();
        match err {
            ProviderError::Api { status, body, .. } => {
                assert_eq!(status, 402);
                assert_eq!(body, "insufficient credits");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        // Nothing listens here; a request would fail with an HTTP error instead
        let err = client("http://127.0.0.1:9".to_string(), None)
            .chat("m", &[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials(_)));

        let engine_err: node_engine::NodeEngineError = err.into();
        assert!(engine_err.to_string().contains("OpenRouter API key is not configured"));
    }

    #[tokio::test]
    async fn test_validate_api_key() {
        let app = Router::new().route(
            "/models",
            get(|headers: HeaderMap| async move {
                if headers["authorization"] == "Bearer good" {
                    (
                        StatusCode::OK,
                        Json(json!({"data": [{"id": "qwen/qwen3-4b:free", "name": "Qwen", "context_length": 32768}]})),
                    )
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})))
                }
            }),
        );
        let base = spawn_mock(app).await;

        let ok = client(base.clone(), Some("good")).validate_api_key().await;
        assert!(ok.valid);
        let models = ok.models.unwrap();
        assert_eq!(models[0].id, "qwen/qwen3-4b:free");
        assert_eq!(models[0].context_length, Some(32768));

        let bad = client(base, Some("bad")).validate_api_key().await;
        assert!(!bad.valid);
        assert!(bad.error.unwrap().contains("Invalid API key"));
    }

    #[test]
    fn test_curated_models() {
        assert!(is_curated_model(node_engine::constants::defaults::MODEL));
        assert!(!is_curated_model("openai/gpt-4"));
    }
}
