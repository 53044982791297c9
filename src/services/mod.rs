// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Hosts the chat turn orchestration and the sales statistics tool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! Domain service layer
//!
//! Business logic that sits between the HTTP routes and the data, chat store,
//! and model clients.

/// Chat turns: history, persistence, tool decision, and narrative
pub mod chat_orchestration;

/// The `getStats` tool: argument handling, summary, and analysis text
pub mod stats_tool;

pub use chat_orchestration::{ChatOrchestrator, ChatSettings, ChatTurnRequest, ChatTurnResult};
pub use stats_tool::{run_stats_tool, stats_tool, StatsSummary};
