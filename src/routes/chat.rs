// ABOUTME: Chat route handlers for conversations, message history, and assistant turns
// ABOUTME: Serves the chat UI message shape and delegates turns to the orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! Chat routes
//!
//! - `POST /api/chat` runs one assistant turn and always answers 200
//! - `/api/conversations` lists and creates conversations
//! - `/api/conversations/:id` renames and deletes
//! - `/api/conversations/:id/messages` returns the stored messages as UI parts

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use commerce_core::constants::{chat, messages};
use commerce_core::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::database::{ConversationRecord, MessageRecord};
use crate::llm::MessageRole;
use crate::resources::ServerResources;
use crate::services::{ChatTurnRequest, ChatTurnResult};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Rename request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenameConversationRequest {
    pub title: Option<String>,
}

/// Conversation list
#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub success: bool,
    pub conversations: Vec<ConversationRecord>,
}

/// Newly created conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub success: bool,
    pub conversation: ConversationRecord,
}

/// One part of a message as rendered by the chat UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum MessagePart {
    /// Message text
    #[serde(rename = "text")]
    Text { text: String },
    /// Output of the first tool that ran for the message
    #[serde(rename = "tool-result")]
    ToolResult {
        state: String,
        output: Value,
        tool: String,
    },
}

/// Stored message as rendered by the chat UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiMessage {
    pub id: String,
    pub role: MessageRole,
    pub parts: Vec<MessagePart>,
}

impl From<MessageRecord> for UiMessage {
    fn from(record: MessageRecord) -> Self {
        let mut parts = vec![MessagePart::Text {
            text: record.content,
        }];
        if let Some(first) = record
            .tool_invocations
            .and_then(|list| list.into_iter().next())
        {
            parts.push(MessagePart::ToolResult {
                state: chat::TOOL_STATE_OUTPUT_AVAILABLE.to_owned(),
                output: first.output,
                tool: first.kind,
            });
        }

        Self {
            id: record.id,
            role: record.role,
            parts,
        }
    }
}

/// Message history for a conversation
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub success: bool,
    pub messages: Vec<UiMessage>,
}

// ============================================================================
// Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::chat_turn))
            .route(
                "/api/conversations",
                get(Self::list_conversations).post(Self::create_conversation),
            )
            .route(
                "/api/conversations/:conversation_id",
                put(Self::rename_conversation).delete(Self::delete_conversation),
            )
            .route(
                "/api/conversations/:conversation_id/messages",
                get(Self::get_messages),
            )
            .with_state(resources)
    }

    /// Run one assistant turn; unreadable bodies still get a turn result
    async fn chat_turn(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<ChatTurnRequest>, JsonRejection>,
    ) -> Response {
        let request = match body {
            Ok(Json(request)) => request,
            Err(rejection) => {
                warn!(status = %rejection.status(), "Unreadable chat turn body: {rejection}");
                let result = ChatTurnResult::failed(messages::MISSING_CONVERSATION_ID);
                return (StatusCode::OK, Json(result)).into_response();
            }
        };

        let result = resources
            .chat
            .chat_message(
                request.conversation_id.as_deref(),
                request.message.as_deref(),
            )
            .await;
        (StatusCode::OK, Json(result)).into_response()
    }

    /// List conversations, most recently updated first
    async fn list_conversations(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let conversations = resources.chat_store.list_conversations().await?;
        Ok((
            StatusCode::OK,
            Json(ConversationListResponse {
                success: true,
                conversations,
            }),
        )
            .into_response())
    }

    /// Create an empty conversation with the default title
    #[instrument(skip(resources))]
    async fn create_conversation(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let conversation = resources
            .chat_store
            .create_conversation(chat::DEFAULT_CONVERSATION_TITLE)
            .await?;
        info!(conversation_id = %conversation.id, "Conversation created");

        Ok((
            StatusCode::CREATED,
            Json(ConversationResponse {
                success: true,
                conversation,
            }),
        )
            .into_response())
    }

    /// Rename a conversation
    #[instrument(skip(resources, request))]
    async fn rename_conversation(
        State(resources): State<Arc<ServerResources>>,
        Path(conversation_id): Path<String>,
        Json(request): Json<RenameConversationRequest>,
    ) -> Result<Response, AppError> {
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::invalid_input(messages::MISSING_TITLE))?;

        if !resources
            .chat_store
            .rename_conversation(&conversation_id, title)
            .await?
        {
            return Err(AppError::not_found(format!(
                "Conversation {conversation_id} not found"
            )));
        }

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    /// Delete a conversation and its messages
    #[instrument(skip(resources))]
    async fn delete_conversation(
        State(resources): State<Arc<ServerResources>>,
        Path(conversation_id): Path<String>,
    ) -> Result<Response, AppError> {
        if !resources
            .chat_store
            .delete_conversation(&conversation_id)
            .await?
        {
            return Err(AppError::not_found(format!(
                "Conversation {conversation_id} not found"
            )));
        }
        info!("Conversation deleted");

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    /// Messages of a conversation, oldest first
    async fn get_messages(
        State(resources): State<Arc<ServerResources>>,
        Path(conversation_id): Path<String>,
    ) -> Result<Response, AppError> {
        let records = resources.chat_store.list_messages(&conversation_id).await?;
        let messages = records.into_iter().map(UiMessage::from).collect();

        Ok((
            StatusCode::OK,
            Json(MessageListResponse {
                success: true,
                messages,
            }),
        )
            .into_response())
    }
}
