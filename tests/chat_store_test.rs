// ABOUTME: Database tests for the conversation and message store
// ABOUTME: Covers ordering, rename and delete semantics, history windows, and referential integrity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use commerce_insights_server::{
    database::{ChatStore, Database},
    llm::{MessageRole, ToolInvocationRecord},
};
use common::create_test_database;
use serde_json::json;

async fn store() -> ChatStore {
    create_test_database().await.unwrap().chat()
}

#[tokio::test]
async fn test_conversations_listed_most_recent_first() {
    let store = store().await;
    let older = store.create_conversation("Primera").await.unwrap();
    let newer = store.create_conversation("Segunda").await.unwrap();

    let listed = store.list_conversations().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[1].id, older.id);

    store.append_user_message(&older.id, "hola").await.unwrap();
    let listed = store.list_conversations().await.unwrap();
    assert_eq!(listed[0].id, older.id);
}

#[tokio::test]
async fn test_rename_bumps_updated_at() {
    let store = store().await;
    let conversation = store.create_conversation("Nueva").await.unwrap();

    assert!(store
        .rename_conversation(&conversation.id, "Ventas")
        .await
        .unwrap());
    assert!(!store.rename_conversation("missing", "Ventas").await.unwrap());

    let stored = store
        .get_conversation(&conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Ventas");
    assert_eq!(stored.created_at, conversation.created_at);
    assert!(stored.updated_at >= conversation.updated_at);
}

#[tokio::test]
async fn test_delete_removes_messages() {
    let store = store().await;
    let keep = store.create_conversation("Queda").await.unwrap();
    let drop = store.create_conversation("Se va").await.unwrap();
    store.append_user_message(&keep.id, "uno").await.unwrap();
    store.append_user_message(&drop.id, "dos").await.unwrap();
    store
        .add_assistant_message(&drop.id, "tres", None)
        .await
        .unwrap();

    assert!(store.delete_conversation(&drop.id).await.unwrap());
    assert!(!store.delete_conversation(&drop.id).await.unwrap());

    assert!(store.get_conversation(&drop.id).await.unwrap().is_none());
    assert_eq!(store.message_count(&drop.id).await.unwrap(), 0);
    assert_eq!(store.message_count(&keep.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_recent_messages_window_is_chronological() {
    let store = store().await;
    let conversation = store.create_conversation("Ventana").await.unwrap();
    for i in 0..6 {
        store
            .append_user_message(&conversation.id, &format!("m{i}"))
            .await
            .unwrap();
    }

    let recent = store.recent_messages(&conversation.id, 4).await.unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m2", "m3", "m4", "m5"]);

    let all = store.recent_messages(&conversation.id, 30).await.unwrap();
    assert_eq!(all.len(), 6);
    assert_eq!(all[0].content, "m0");
}

#[tokio::test]
async fn test_assistant_invocations_round_trip() {
    let store = store().await;
    let conversation = store.create_conversation("Herramientas").await.unwrap();
    let invocation = ToolInvocationRecord {
        kind: "tool-getStats".to_owned(),
        input: json!({"dateFrom": "2025-01-01", "dateTo": "2025-01-31"}),
        state: "output-available".to_owned(),
        output: json!({"kpis": {"total_ventas": 10}}),
        tool_call_id: Some("call_9".to_owned()),
    };

    store
        .add_assistant_message(&conversation.id, "sin datos", Some(&[]))
        .await
        .unwrap();
    store
        .add_assistant_message(
            &conversation.id,
            "con datos",
            Some(std::slice::from_ref(&invocation)),
        )
        .await
        .unwrap();

    let messages = store.list_messages(&conversation.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::Assistant);
    assert!(messages[0].tool_invocations.is_none());
    assert_eq!(messages[1].tool_invocations, Some(vec![invocation]));
}

#[tokio::test]
async fn test_messages_require_existing_conversation() {
    let store = store().await;

    let err = store
        .append_user_message("no-such-conversation", "hola")
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 500);

    let err = store
        .add_assistant_message("no-such-conversation", "hola", None)
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 500);
}

#[tokio::test]
async fn test_file_database_creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("chat.db");
    let url = format!("sqlite:{}", path.display());

    let database = Database::new(&url).await.unwrap();
    let conversation = database
        .chat()
        .create_conversation("Persistida")
        .await
        .unwrap();
    assert!(path.exists());

    // Reopening runs the idempotent migrations and keeps the data
    let reopened = Database::new(&url).await.unwrap();
    let stored = reopened
        .chat()
        .get_conversation(&conversation.id)
        .await
        .unwrap();
    assert_eq!(stored.map(|c| c.title).as_deref(), Some("Persistida"));
}
