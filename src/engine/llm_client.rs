use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::tools::ToolDefinition;
use crate::model::message::{Role, ToolCall, Turn};

pub const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai/v1";
pub const DEFAULT_MODEL: &str = "qwen-3-32b";

/// Provider failure, classified so logs can tell transient from fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Decode, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        let kind = match status.as_u16() {
            401 | 403 => ProviderErrorKind::Auth,
            429 => ProviderErrorKind::RateLimit,
            400..=499 => ProviderErrorKind::InvalidRequest,
            500..=599 => ProviderErrorKind::ServerError,
            _ => ProviderErrorKind::Unknown,
        };
        Self::new(kind, format!("provider returned {status}: {body}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Network,
    RateLimit,
    ServerError,
    Auth,
    InvalidRequest,
    /// The response body was not a usable completion.
    Decode,
    Unknown,
}

impl ProviderErrorKind {
    /// Whether a later attempt could succeed. The engine never retries on
    /// its own; this only feeds logs and callers.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}

/// Everything one round trip sends: ordered turns plus the capability schema.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Turn>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f32,
}

/// The single assistant message of a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub role: Role,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::text(content)
        }
    }
}

/// Boundary to the completion provider. One blocking call per round trip.
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    fn model_id(&self) -> &str;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ChatFunction<'a>,
}

#[derive(Serialize)]
struct ChatFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    role: Option<Role>,
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// OpenAI-compatible chat-completions client (Cerebras, LM Studio, ...).
pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model_id: String,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model_id: model.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Cheap connectivity probe: lists the models the endpoint serves.
    pub fn list_models(&self) -> anyhow::Result<String> {
        let resp: ModelList = self
            .authorized(self.client.get(self.endpoint("models")))
            .send()
            .context("could not reach the completion provider")?
            .error_for_status()
            .context("completion provider rejected the model listing")?
            .json()
            .context("model listing was not valid JSON")?;

        Ok(format!("Connected ({} models available)", resp.data.len()))
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionRequest<'a> {
        let tools: Vec<ChatTool<'a>> = request
            .tools
            .iter()
            .map(|t| ChatTool {
                kind: "function",
                function: ChatFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect();

        // The model decides whether to call a capability.
        let tool_choice = (!tools.is_empty()).then_some("auto");

        ChatCompletionRequest {
            model: &self.model_id,
            messages: &request.messages,
            tools,
            tool_choice,
            temperature: request.temperature,
        }
    }
}

impl CompletionProvider for ChatCompletionsClient {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = self.build_request(request);

        let response = self
            .authorized(self.client.post(self.endpoint("chat/completions")))
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    ProviderError::network(format!("connection failed: {e}"))
                } else {
                    ProviderError::unknown(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ProviderError::network(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status, &text));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::decode(format!("malformed completion: {e}")))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ProviderError::decode("completion had no choices"))?;

        Ok(CompletionResponse {
            role: message.role.unwrap_or(Role::Assistant),
            content: message.content.unwrap_or_default(),
            tool_calls: message.tool_calls.unwrap_or_default(),
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Logs duration and outcome of every round trip of the wrapped provider.
pub struct LoggingProvider {
    inner: Arc<dyn CompletionProvider>,
    model_id: String,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn CompletionProvider>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

impl CompletionProvider for LoggingProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let start = Instant::now();
        let result = self.inner.complete(request);
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    turns = request.messages.len(),
                    tool_calls = response.tool_calls.len(),
                    "completion finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "completion failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tools::capability_schema;

    fn client() -> ChatCompletionsClient {
        ChatCompletionsClient::new(
            "http://localhost:1234/v1/",
            Some("key".into()),
            DEFAULT_MODEL,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn request_carries_schema_and_auto_mode() {
        let client = client();
        let request = CompletionRequest {
            messages: vec![Turn::system("narrate"), Turn::user("begin")],
            tools: capability_schema(),
            temperature: 0.7,
        };

        let value = serde_json::to_value(client.build_request(&request)).unwrap();
        assert_eq!(value["model"], DEFAULT_MODEL);
        assert_eq!(value["tool_choice"], "auto");
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], "move_character");
        assert_eq!(value["messages"][1]["role"], "user");
    }

    #[test]
    fn request_without_tools_omits_tool_choice() {
        let request = CompletionRequest {
            messages: vec![Turn::system("narrate")],
            tools: Vec::new(),
            temperature: 0.7,
        };

        let value = serde_json::to_value(client().build_request(&request)).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(
            client().endpoint("chat/completions"),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn response_with_tool_call_decodes() {
        let body = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "move_character",
                            "arguments": "{\"character_name\":\"Elara\",\"location\":\"Market\"}"
                        }
                    }]
                }
            }]
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let message = &parsed.choices[0].message;
        assert!(message.content.is_none());
        assert_eq!(message.tool_calls.as_ref().unwrap()[0].name(), "move_character");
    }

    #[test]
    fn status_codes_classify() {
        let auth = ProviderError::from_status(StatusCode::UNAUTHORIZED, "");
        let limited = ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, "");
        let server = ProviderError::from_status(StatusCode::BAD_GATEWAY, "");

        assert_eq!(auth.kind, ProviderErrorKind::Auth);
        assert!(limited.kind.is_retryable());
        assert!(server.kind.is_retryable());
        assert!(!auth.kind.is_retryable());
    }
}
