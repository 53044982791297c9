// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! Configuration is read once at startup from environment variables and then
//! shared read-only through `ServerResources`.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    ChatConfig, CorsConfig, DatabaseConfig, Environment, LlmConfig, LogLevel, OperativoConfig,
    ServerConfig, SupabaseConfig,
};
