// ABOUTME: Chat turn orchestration: history, persistence, tool-assisted decision, and narrative phases
// ABOUTME: Converts every failure inside a turn into a generic error result without persisting a reply
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use commerce_core::constants::{chat, messages};
use commerce_core::errors::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::stats_tool::{run_stats_tool, stats_tool, StatsSummary};
use crate::database::{ChatStore, MessageRecord};
use crate::llm::prompts::{
    business_analyst_prompt, ANALYSIS_INSTRUCTION, ANALYSIS_PREAMBLE, NARRATIVE_TASK_PROMPT,
};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, ToolInvocationRecord};
use crate::rpc::RpcClient;

/// Body of a chat turn request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatTurnRequest {
    pub conversation_id: Option<String>,
    pub message: Option<String>,
}

/// Outcome of a chat turn as returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatTurnResult {
    /// The assistant answered
    Completed {
        success: bool,
        message: String,
        #[serde(rename = "toolData")]
        tool_data: Option<Value>,
    },
    /// The turn was rejected or failed
    Failed { success: bool, error: String },
}

impl ChatTurnResult {
    fn completed(message: String, tool_data: Option<Value>) -> Self {
        Self::Completed {
            success: true,
            message,
            tool_data,
        }
    }

    /// Rejected or failed turn carrying a user-facing error
    #[must_use]
    pub fn failed(error: &str) -> Self {
        Self::Failed {
            success: false,
            error: error.to_owned(),
        }
    }

    /// Whether the assistant answered
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Settings for chat turns
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Company whose stats the tool reads
    pub company_id: String,
    /// Messages of history sent to the model
    pub history_limit: u32,
    /// Model name
    pub model: String,
}

/// What the model produced for a turn
struct TurnOutcome {
    text: String,
    summary: Option<StatsSummary>,
    invocations: Option<Vec<ToolInvocationRecord>>,
}

/// Runs chat turns against the store, the data service, and the model
#[derive(Clone)]
pub struct ChatOrchestrator {
    store: ChatStore,
    rpc: Arc<dyn RpcClient>,
    llm: Arc<dyn LlmProvider>,
    settings: ChatSettings,
}

impl ChatOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(
        store: ChatStore,
        rpc: Arc<dyn RpcClient>,
        llm: Arc<dyn LlmProvider>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            store,
            rpc,
            llm,
            settings,
        }
    }

    /// Handle one user turn. Never fails: errors become a generic failure result.
    #[instrument(skip(self, message), fields(conversation_id = conversation_id.unwrap_or_default()))]
    pub async fn chat_message(
        &self,
        conversation_id: Option<&str>,
        message: Option<&str>,
    ) -> ChatTurnResult {
        let Some(conversation_id) = conversation_id.map(str::trim).filter(|id| !id.is_empty())
        else {
            return ChatTurnResult::failed(messages::MISSING_CONVERSATION_ID);
        };
        let Some(user_text) = message.filter(|m| !m.trim().is_empty()) else {
            return ChatTurnResult::failed(messages::MISSING_USER_MESSAGE);
        };

        // History is read before the new message is stored so it never includes it
        let history = self.load_history(conversation_id).await;

        if let Err(e) = self
            .store
            .append_user_message(conversation_id, user_text)
            .await
        {
            error!(error = %e, "Failed to store user message");
            return ChatTurnResult::failed(messages::CHAT_SERVER_ERROR);
        }

        match self.run_turn(conversation_id, &history, user_text).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Chat turn failed");
                ChatTurnResult::failed(messages::CHAT_SERVER_ERROR)
            }
        }
    }

    /// Most recent messages as model input, oldest first; store failures yield no history
    async fn load_history(&self, conversation_id: &str) -> Vec<ChatMessage> {
        match self
            .store
            .recent_messages(conversation_id, self.settings.history_limit)
            .await
        {
            Ok(records) => records.iter().map(to_chat_message).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to load chat history; continuing without it");
                Vec::new()
            }
        }
    }

    async fn run_turn(
        &self,
        conversation_id: &str,
        history: &[ChatMessage],
        user_text: &str,
    ) -> AppResult<ChatTurnResult> {
        let outcome = self.generate(history, user_text).await?;

        self.store
            .add_assistant_message(conversation_id, &outcome.text, outcome.invocations.as_deref())
            .await?;

        let tool_data = outcome
            .summary
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        info!(tool_used = tool_data.is_some(), "Chat turn completed");
        Ok(ChatTurnResult::completed(outcome.text, tool_data))
    }

    async fn generate(&self, history: &[ChatMessage], user_text: &str) -> AppResult<TurnOutcome> {
        let decision_request = ChatRequest::new(conversation_messages(
            business_analyst_prompt(today()),
            history,
            user_text,
        ))
        .with_model(&self.settings.model);

        let decision = if self.llm.capabilities().supports_tool_calls() {
            self.llm
                .complete_with_tools(&decision_request, &[stats_tool()])
                .await?
        } else {
            debug!(provider = self.llm.name(), "Provider cannot call tools; answering from history only");
            self.llm.complete(&decision_request).await?.into()
        };

        let Some(shape) = decision.tool_calls.as_ref().filter(|s| !s.is_empty()) else {
            return Ok(TurnOutcome {
                text: decision.text().to_owned(),
                summary: None,
                invocations: None,
            });
        };

        let summary = match shape.find(chat::STATS_TOOL_NAME) {
            Some(call) => {
                run_stats_tool(self.rpc.as_ref(), &self.settings.company_id, &call.input).await
            }
            None => {
                warn!("Model called an unknown tool; answering without data");
                None
            }
        };

        let Some(summary) = summary else {
            return Ok(TurnOutcome {
                text: decision.text().to_owned(),
                summary: None,
                invocations: None,
            });
        };

        let output = serde_json::to_value(&summary)?;
        let invocations = shape.to_invocations(&output);

        let mut narrative_messages =
            conversation_messages(NARRATIVE_TASK_PROMPT.to_owned(), history, user_text);
        narrative_messages.push(ChatMessage::assistant(format!(
            "{ANALYSIS_PREAMBLE}{}",
            summary.analysis_text()
        )));
        narrative_messages.push(ChatMessage::user(ANALYSIS_INSTRUCTION));

        let narrative = self
            .llm
            .complete(&ChatRequest::new(narrative_messages).with_model(&self.settings.model))
            .await
            .map_err(|e| {
                warn!(tool = chat::STATS_TOOL_NAME, error = %e, "Narrative phase failed after the tool ran");
                e
            })?;

        Ok(TurnOutcome {
            text: narrative.content,
            summary: Some(summary),
            invocations: Some(invocations),
        })
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn to_chat_message(record: &MessageRecord) -> ChatMessage {
    ChatMessage::new(record.role, record.content.clone())
}

fn conversation_messages(
    system_prompt: String,
    history: &[ChatMessage],
    user_text: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(user_text));
    messages
}
