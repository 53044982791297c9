// ABOUTME: OpenAI-compatible chat completions provider with tool calling and bounded retries
// ABOUTME: Maps both content-part and top-level tool-call responses into ToolCallShape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! # `OpenAI`-Compatible Provider
//!
//! Works with any endpoint that implements the `OpenAI` chat completions API.
//! Each request gets the configured timeout, and transient failures (transport
//! errors, 429, 5xx) are retried up to `max_retries` times.

use std::time::Duration;

use async_trait::async_trait;
use commerce_core::errors::{AppError, ErrorCode};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::{
    ChatMessage, ChatRequest, ChatResponse, ChatResponseWithTools, LlmCapabilities, LlmProvider,
    TokenUsage, Tool, ToolCallPart, ToolCallShape, TopLevelToolCall,
};
use crate::config::LlmConfig;

/// Service name used in error messages
const SERVICE_NAME: &str = "LLM";

/// Connection timeout for the model endpoint
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Pause between retry attempts
const RETRY_BACKOFF_MS: u64 = 500;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<OpenAiContent>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

/// Message content: plain text, or a list of typed parts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<Value>),
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiToolCall {
    #[serde(default)]
    id: Option<String>,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <https://api.openai.com/v1>)
    pub base_url: String,
    /// Bearer token, if the endpoint needs one
    pub api_key: Option<String>,
    /// Default model
    pub default_model: String,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Retries after the first failed attempt
    pub max_retries: u32,
}

impl std::fmt::Debug for OpenAiCompatibleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl From<&LlmConfig> for OpenAiCompatibleConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            default_model: config.model.clone(),
            timeout: config.timeout(),
            max_retries: config.max_retries,
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// `OpenAI`-compatible chat provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized OpenAI-compatible provider"
        );
        Ok(Self { client, config })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.header("Authorization", format!("Bearer {api_key}"))
        } else {
            request
        }
    }

    fn build_request(&self, request: &ChatRequest, tools: &[Tool]) -> OpenAiRequest {
        let openai_tools = Self::convert_tools(tools);
        let has_tools = !openai_tools.is_empty();
        OpenAiRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: has_tools.then_some(openai_tools),
            tool_choice: has_tools.then(|| "auto".to_owned()),
        }
    }

    /// Parse error response from API
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let message = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |parsed| parsed.error.message,
        );
        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("{SERVICE_NAME}: authentication failed: {message}"),
            ),
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                format!("{SERVICE_NAME}: rate limit reached: {message}"),
            ),
            500..=599 => AppError::new(
                ErrorCode::ExternalServiceUnavailable,
                format!("{SERVICE_NAME}: API error ({status}): {message}"),
            ),
            _ => AppError::external_service(SERVICE_NAME, format!("API error ({status}): {message}")),
        }
    }

    /// Any failure to exchange bytes with the endpoint counts as transient
    fn transport_error(e: reqwest::Error) -> AppError {
        error!("Model endpoint transport failure: {e}");
        AppError::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("{SERVICE_NAME}: transport error: {e}"),
        )
    }

    const fn is_retryable(err: &AppError) -> bool {
        matches!(
            err.code,
            ErrorCode::ExternalServiceUnavailable | ErrorCode::ExternalRateLimited
        )
    }

    fn convert_tools(tools: &[Tool]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .flat_map(|tool| {
                tool.function_declarations.iter().map(|func| OpenAiTool {
                    tool_type: "function".to_owned(),
                    function: OpenAiFunction {
                        name: func.name.clone(),
                        description: func.description.clone(),
                        parameters: func.parameters.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_tool_calls(tool_calls: &[OpenAiToolCall]) -> Vec<TopLevelToolCall> {
        tool_calls
            .iter()
            .map(|call| {
                let args = serde_json::from_str::<Value>(&call.function.arguments)
                    .unwrap_or_else(|e| {
                        warn!(tool = %call.function.name, "Unparseable tool arguments: {e}");
                        Value::Null
                    });
                TopLevelToolCall {
                    tool_name: call.function.name.clone(),
                    args: Some(args),
                    input: None,
                    tool_call_id: None,
                    id: call.id.clone(),
                }
            })
            .collect()
    }

    /// Split content into its text and any embedded tool-call parts
    fn split_content(content: Option<OpenAiContent>) -> (Option<String>, Vec<ToolCallPart>) {
        match content {
            None => (None, Vec::new()),
            Some(OpenAiContent::Text(text)) => (Some(text), Vec::new()),
            Some(OpenAiContent::Parts(parts)) => {
                let mut text = String::new();
                let mut calls = Vec::new();
                for part in parts {
                    match part.get("type").and_then(Value::as_str) {
                        Some("text") => {
                            if let Some(t) = part.get("text").and_then(Value::as_str) {
                                text.push_str(t);
                            }
                        }
                        Some("tool-call") => match serde_json::from_value::<ToolCallPart>(part) {
                            Ok(call) => calls.push(call),
                            Err(e) => warn!("Skipping malformed tool-call part: {e}"),
                        },
                        _ => {}
                    }
                }
                ((!text.is_empty()).then_some(text), calls)
            }
        }
    }

    fn into_response(response: OpenAiResponse) -> Result<ChatResponseWithTools, AppError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(SERVICE_NAME, "API returned no choices"))?;

        let (content, parts) = Self::split_content(choice.message.content);
        let top_level = choice
            .message
            .tool_calls
            .as_deref()
            .map(Self::convert_tool_calls)
            .unwrap_or_default();

        Ok(ChatResponseWithTools {
            content,
            tool_calls: ToolCallShape::select(parts, top_level),
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    async fn send_once(&self, body: &OpenAiRequest) -> Result<OpenAiResponse, AppError> {
        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .json(body);

        let response = self
            .add_auth_header(http_request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(Self::transport_error)?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(
                "Failed to parse API response: {e} - body: {}",
                text.chars().take(500).collect::<String>()
            );
            AppError::external_service(SERVICE_NAME, format!("Failed to parse response: {e}"))
        })
    }

    async fn send_with_retries(&self, body: &OpenAiRequest) -> Result<OpenAiResponse, AppError> {
        let mut attempt = 0;
        loop {
            match self.send_once(body).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.config.max_retries && Self::is_retryable(&err) => {
                    attempt += 1;
                    warn!(attempt, error = %err, "Retrying model request");
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI-compatible"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::TOOL_CALLS | LlmCapabilities::SYSTEM_MESSAGES
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let response = self.complete_with_tools(request, &[]).await?;
        Ok(ChatResponse {
            content: response.content.unwrap_or_default(),
            model: response.model,
            usage: response.usage,
            finish_reason: response.finish_reason,
        })
    }

    #[instrument(skip(self, request, tools), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model), tools = tools.len()))]
    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
    ) -> Result<ChatResponseWithTools, AppError> {
        let body = self.build_request(request, tools);
        debug!(messages = body.messages.len(), "Sending chat completion request");

        let response = Self::into_response(self.send_with_retries(&body).await?)?;

        debug!(
            content_len = response.content.as_ref().map(String::len),
            tool_calls = response.has_tool_calls(),
            finish_reason = ?response.finish_reason,
            "Received chat completion"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> ChatResponseWithTools {
        let response: OpenAiResponse = serde_json::from_value(body).unwrap();
        OpenAiCompatibleProvider::into_response(response).unwrap()
    }

    #[test]
    fn plain_text_response() {
        let response = parse(json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"content": "Hola"}, "finish_reason": "stop"}]
        }));
        assert_eq!(response.text(), "Hola");
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn top_level_tool_calls_parse_arguments() {
        let response = parse(json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "getStats", "arguments": "{\"dateFrom\":\"2025-01-01\",\"dateTo\":\"2025-01-31\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }));
        let call = response.tool_calls.unwrap().find("getStats").unwrap();
        assert_eq!(call.input["dateTo"], json!("2025-01-31"));
        assert_eq!(call.tool_call_id.as_deref(), Some("call_abc"));
    }

    #[test]
    fn content_parts_win_over_top_level() {
        let response = parse(json!({
            "model": "m",
            "choices": [{
                "message": {
                    "content": [
                        {"type": "text", "text": "Obtengo los datos."},
                        {"type": "tool-call", "toolName": "getStats", "toolCallId": "p1", "args": {"dateFrom": "2025-03-01", "dateTo": "2025-03-31"}}
                    ],
                    "tool_calls": [{"id": "t1", "function": {"name": "getStats", "arguments": "{}"}}]
                },
                "finish_reason": "tool_calls"
            }]
        }));
        assert_eq!(response.text(), "Obtengo los datos.");
        match response.tool_calls.unwrap() {
            ToolCallShape::MessageParts(parts) => {
                assert_eq!(parts.len(), 1);
                assert_eq!(parts[0].tool_call_id.as_deref(), Some("p1"));
            }
            ToolCallShape::TopLevel(_) => panic!("expected message parts"),
        }
    }

    #[test]
    fn error_statuses_classify_retries() {
        let rate = OpenAiCompatibleProvider::parse_error_response(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down"}}"#,
        );
        assert!(OpenAiCompatibleProvider::is_retryable(&rate));
        assert!(rate.message.contains("slow down"));

        let bad = OpenAiCompatibleProvider::parse_error_response(StatusCode::BAD_REQUEST, "nope");
        assert!(!OpenAiCompatibleProvider::is_retryable(&bad));

        let down = OpenAiCompatibleProvider::parse_error_response(StatusCode::BAD_GATEWAY, "<html>");
        assert!(OpenAiCompatibleProvider::is_retryable(&down));
    }

    #[tokio::test]
    async fn send_failures_are_retryable() {
        let err = Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();
        let mapped = OpenAiCompatibleProvider::transport_error(err);
        assert_eq!(mapped.code, ErrorCode::ExternalServiceUnavailable);
        assert!(OpenAiCompatibleProvider::is_retryable(&mapped));
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response: OpenAiResponse =
            serde_json::from_value(json!({"model": "m", "choices": []})).unwrap();
        assert!(OpenAiCompatibleProvider::into_response(response).is_err());
    }
}
