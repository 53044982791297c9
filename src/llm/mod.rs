// ABOUTME: Chat model abstraction used by the business-analyst assistant
// ABOUTME: Defines conversation messages, completion requests and replies, tool declarations, and the provider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! # Chat Models
//!
//! A chat turn needs two things from a model: a first reply that may ask for
//! the statistics tool, and a plain narrative reply once the tool has run.
//! [`LlmProvider`] exposes exactly those two calls. The production provider
//! speaks the `OpenAI` chat-completions protocol; tests plug in scripted ones.
//!
//! Tool calls come back in one of two shapes (see [`ToolCallShape`]) and are
//! normalized before the turn looks at them.
//!
//! ```rust,no_run
//! use commerce_insights_server::llm::{ChatMessage, ChatRequest, LlmProvider};
//!
//! async fn ask(provider: &dyn LlmProvider) {
//!     let request = ChatRequest::new(vec![
//!         ChatMessage::system("Sos un analista de negocio."),
//!         ChatMessage::user("¿Cómo vienen las ventas?"),
//!     ]);
//!     let _reply = provider.complete(&request).await;
//! }
//! ```

mod openai_compatible;
pub mod prompts;
pub mod tool_calls;

pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use tool_calls::{
    NormalizedCall, ToolCallPart, ToolCallShape, ToolInvocationRecord, TopLevelToolCall,
};

use async_trait::async_trait;
use commerce_core::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

bitflags::bitflags! {
    /// What a provider can do beyond plain completions
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Accepts tool declarations and reports tool calls
        const TOOL_CALLS = 0b0000_0001;
        /// Honors a leading system message
        const SYSTEM_MESSAGES = 0b0000_0010;
    }
}

impl LlmCapabilities {
    /// Whether tools can be offered to the model
    #[must_use]
    pub const fn supports_tool_calls(&self) -> bool {
        self.contains(Self::TOOL_CALLS)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Wire and storage name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse a stored role; unknown values count as user turns
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "assistant" => Self::Assistant,
            "system" => Self::System,
            _ => Self::User,
        }
    }
}

/// One message sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Messages plus optional sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Falls back to the provider's default model when unset
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Plain completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

/// Completion that may carry tool calls instead of, or next to, text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponseWithTools {
    pub content: Option<String>,
    pub tool_calls: Option<ToolCallShape>,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

impl ChatResponseWithTools {
    /// Whether at least one tool call came back
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Reply text, empty when the model only called tools
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

impl From<ChatResponse> for ChatResponseWithTools {
    fn from(response: ChatResponse) -> Self {
        Self {
            content: Some(response.content),
            tool_calls: None,
            model: response.model,
            usage: response.usage,
            finish_reason: response.finish_reason,
        }
    }
}

/// A function the model may call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Group of function declarations offered in one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Chat completion backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn capabilities(&self) -> LlmCapabilities;

    /// Model used when a request does not name one
    fn default_model(&self) -> &str;

    /// Text-only completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;

    /// Completion with `tools` on offer
    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
    ) -> Result<ChatResponseWithTools, AppError>;
}
