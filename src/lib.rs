// ABOUTME: Main library entry point for the commerce insights dashboard backend
// ABOUTME: Provides finance, marketing, and CRM views plus a stats-aware chat assistant over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Commerce Insights Server
//!
//! Backend for a retail business-intelligence dashboard. Sales, product,
//! Meta Ads, and CRM data live in a hosted Postgres exposed through
//! `PostgREST`; this server calls its stored procedures, keeps chat
//! conversations in a local `SQLite` database, and runs a chat assistant
//! that can fetch sales statistics through a tool call before answering.
//!
//! ## Architecture
//!
//! - **rpc**: typed client for remote stored procedures and table reads
//! - **data**: one function per procedure, grouped by dashboard area
//! - **database**: conversation and message persistence
//! - **llm**: chat model provider and tool-call normalization
//! - **services**: chat turn orchestration and the statistics tool
//! - **routes**: HTTP handlers, grouped per dashboard area
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use commerce_insights_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Listening on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Session token validation
pub mod auth;

/// Environment-based configuration
pub mod config;

/// Remote data access, one function per stored procedure
pub mod data;

/// Chat conversation storage
pub mod database;

/// Chat model providers, prompts, and tool-call shapes
pub mod llm;

/// Structured logging setup
pub mod logging;

/// HTTP middleware: session guard, CORS, request spans
pub mod middleware;

/// Shared server resources
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Stored-procedure client
pub mod rpc;

/// Server assembly and lifecycle
pub mod server;

/// Chat orchestration and the statistics tool
pub mod services;

/// Error types shared with the core crate
pub use commerce_core::errors;

/// Constants shared with the core crate
pub use commerce_core::constants;
