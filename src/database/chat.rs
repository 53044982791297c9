// ABOUTME: Database operations for chat conversations and their append-only messages
// ABOUTME: Provides windowed history loading and the atomic user-message append
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use chrono::{SecondsFormat, Utc};
use commerce_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::llm::{MessageRole, ToolInvocationRecord};

// ============================================================================
// Database Record Types
// ============================================================================

/// Database representation of a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique conversation ID
    pub id: String,
    /// Conversation title
    pub title: String,
    /// When the conversation was created (RFC 3339)
    pub created_at: String,
    /// When the conversation was last touched (RFC 3339)
    pub updated_at: String,
}

/// Database representation of a chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique message ID
    pub id: String,
    /// Conversation this message belongs to
    pub conversation_id: String,
    /// `user` or `assistant`
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// Tool calls made while producing an assistant message
    pub tool_invocations: Option<Vec<ToolInvocationRecord>>,
    /// When the message was created (RFC 3339)
    pub created_at: String,
}

fn now_timestamp() -> String {
    // Microseconds keep same-turn inserts ordered; rowid breaks remaining ties
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversation_from_row(row: &SqliteRow) -> ConversationRecord {
    ConversationRecord {
        id: row.get("id"),
        title: row.get("title"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn message_from_row(row: &SqliteRow) -> MessageRecord {
    let id: String = row.get("id");
    let raw_invocations: Option<String> = row.get("tool_invocations");
    let tool_invocations = raw_invocations.and_then(|raw| {
        serde_json::from_str(&raw)
            .map_err(|e| warn!(message_id = %id, "Ignoring unreadable tool_invocations: {e}"))
            .ok()
    });
    let role: String = row.get("role");

    MessageRecord {
        id,
        conversation_id: row.get("conversation_id"),
        role: MessageRole::from_stored(&role),
        content: row.get("content"),
        tool_invocations,
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// Chat Store
// ============================================================================

/// Chat database operations
#[derive(Clone)]
pub struct ChatStore {
    pool: SqlitePool,
}

impl ChatStore {
    /// Create a new chat store
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Conversation Operations
    // ========================================================================

    /// Create a new conversation
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create_conversation(&self, title: &str) -> AppResult<ConversationRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            r"
            INSERT INTO conversations (id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ",
        )
        .bind(&id)
        .bind(title)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        Ok(ConversationRecord {
            id,
            title: title.to_owned(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a conversation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_conversation(&self, conversation_id: &str) -> AppResult<Option<ConversationRecord>> {
        let row = sqlx::query(
            "SELECT id, title, created_at, updated_at FROM conversations WHERE id = $1",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        Ok(row.as_ref().map(conversation_from_row))
    }

    /// List conversations, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_conversations(&self) -> AppResult<Vec<ConversationRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, title, created_at, updated_at
            FROM conversations
            ORDER BY updated_at DESC, rowid DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        Ok(rows.iter().map(conversation_from_row).collect())
    }

    /// Rename a conversation, bumping `updated_at`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn rename_conversation(&self, conversation_id: &str, title: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE conversations SET title = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(title)
        .bind(now_timestamp())
        .bind(conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to rename conversation: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a conversation and all its messages (cascade)
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete_conversation(&self, conversation_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete conversation: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Append a user message and bump the conversation's `updated_at` in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails; nothing is written in that case
    pub async fn append_user_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> AppResult<MessageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, role, content, tool_invocations, created_at)
            VALUES ($1, $2, 'user', $3, NULL, $4)
            ",
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(content)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to add user message: {e}")))?;

        sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(&now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to update conversation timestamp: {e}"))
            })?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit user message: {e}")))?;

        Ok(MessageRecord {
            id,
            conversation_id: conversation_id.to_owned(),
            role: MessageRole::User,
            content: content.to_owned(),
            tool_invocations: None,
            created_at: now,
        })
    }

    /// Append an assistant message with the tool calls that produced it
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails
    pub async fn add_assistant_message(
        &self,
        conversation_id: &str,
        content: &str,
        tool_invocations: Option<&[ToolInvocationRecord]>,
    ) -> AppResult<MessageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();
        let stored = tool_invocations
            .filter(|list| !list.is_empty())
            .map(<[_]>::to_vec);
        let serialized = stored.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, role, content, tool_invocations, created_at)
            VALUES ($1, $2, 'assistant', $3, $4, $5)
            ",
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(content)
        .bind(&serialized)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add assistant message: {e}")))?;

        Ok(MessageRecord {
            id,
            conversation_id: conversation_id.to_owned(),
            role: MessageRole::Assistant,
            content: content.to_owned(),
            tool_invocations: stored,
            created_at: now,
        })
    }

    /// All messages for a conversation in chronological order
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_messages(&self, conversation_id: &str) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, role, content, tool_invocations, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    /// The last `limit` messages for a conversation, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, role, content, tool_invocations, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC, rowid DESC
            LIMIT $2
            ",
        )
        .bind(conversation_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recent messages: {e}")))?;

        // Reverse to get chronological order
        let mut messages: Vec<MessageRecord> = rows.iter().map(message_from_row).collect();
        messages.reverse();
        Ok(messages)
    }

    /// Number of messages in a conversation
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn message_count(&self, conversation_id: &str) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count messages: {e}")))?;

        Ok(row.get("count"))
    }
}
