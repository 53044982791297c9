// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into a typed ServerConfig with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! Environment-based configuration management for production deployment

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use commerce_core::constants::{chat, defaults, ports};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Testing => "testing",
        };
        f.write_str(name)
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Chat store
    pub database: DatabaseConfig,
    /// Remote data service
    pub supabase: SupabaseConfig,
    /// Language model provider
    pub llm: LlmConfig,
    /// Chat assistant behavior
    pub chat: ChatConfig,
    /// Operational CRM integrations
    pub operativo: OperativoConfig,
    /// Cross-origin settings
    pub cors: CorsConfig,
}

/// Chat store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL (`sqlite:...`)
    pub url: String,
}

/// Supabase / `PostgREST` connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Key sent as `apikey` and bearer token on data requests
    pub api_key: String,
    /// HS256 secret used to verify session tokens
    pub jwt_secret: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

/// OpenAI-compatible chat completion settings
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL ending in `/v1`
    pub base_url: String,
    /// Bearer key
    pub api_key: Option<String>,
    /// Model used for both chat phases
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
}

impl LlmConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_owned(),
            api_key: None,
            model: chat::DEFAULT_MODEL.to_owned(),
            timeout_secs: chat::LLM_TIMEOUT_SECS,
            max_retries: chat::LLM_MAX_RETRIES,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Chat assistant behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Company identifier passed to the statistics procedure
    pub company_id: String,
    /// Messages of history loaded per turn
    pub history_limit: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            company_id: defaults::COMPANY_ID.to_owned(),
            history_limit: chat::HISTORY_LIMIT,
        }
    }
}

/// Operational CRM integrations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperativoConfig {
    /// Webhook returning the open leads snapshot
    pub leads_webhook_url: Option<String>,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated origins, or `*`
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "*".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse
    pub fn from_env() -> Result<Self> {
        let supabase_url = required_var("SUPABASE_URL")?;
        let api_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|_| env::var("SUPABASE_ANON_KEY"))
            .map_err(|_| {
                anyhow!("Either SUPABASE_SERVICE_ROLE_KEY or SUPABASE_ANON_KEY must be set")
            })?;

        let config = Self {
            host: env_var_or("HOST", "0.0.0.0"),
            http_port: env_var_or("HTTP_PORT", &ports::DEFAULT_HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")),
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", "sqlite:./data/chat.db"),
            },
            supabase: SupabaseConfig {
                url: supabase_url,
                api_key,
                jwt_secret: required_var("SUPABASE_JWT_SECRET")?,
            },
            llm: LlmConfig {
                base_url: env_var_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
                model: env_var_or("CHAT_MODEL", chat::DEFAULT_MODEL),
                timeout_secs: env_var_or("LLM_TIMEOUT_SECS", &chat::LLM_TIMEOUT_SECS.to_string())
                    .parse()
                    .context("Invalid LLM_TIMEOUT_SECS value")?,
                max_retries: env_var_or("LLM_MAX_RETRIES", &chat::LLM_MAX_RETRIES.to_string())
                    .parse()
                    .context("Invalid LLM_MAX_RETRIES value")?,
            },
            chat: ChatConfig {
                company_id: env_var_or("COMPANY_ID", defaults::COMPANY_ID),
                history_limit: env_var_or(
                    "CHAT_HISTORY_LIMIT",
                    &chat::HISTORY_LIMIT.to_string(),
                )
                .parse()
                .context("Invalid CHAT_HISTORY_LIMIT value")?,
            },
            operativo: OperativoConfig {
                leads_webhook_url: env::var("LEADS_WEBHOOK_URL").ok().filter(|u| !u.is_empty()),
            },
            cors: CorsConfig {
                allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when a value would make the server misbehave
    pub fn validate(&self) -> Result<()> {
        if self.supabase.url.trim().is_empty() {
            return Err(anyhow!("SUPABASE_URL cannot be empty"));
        }
        if self.supabase.jwt_secret.is_empty() {
            return Err(anyhow!("SUPABASE_JWT_SECRET cannot be empty"));
        }
        if self.chat.history_limit == 0 {
            return Err(anyhow!("CHAT_HISTORY_LIMIT must be at least 1"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(anyhow!("LLM_TIMEOUT_SECS must be at least 1"));
        }
        Ok(())
    }

    /// Warn about optional integrations left unconfigured
    pub fn warn_missing_integrations(&self) {
        if self.llm.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; chat turns will fail upstream");
        }
        if self.operativo.leads_webhook_url.is_none() {
            warn!("LEADS_WEBHOOK_URL is not set; lead endpoints will return errors");
        }
    }

    /// Summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Commerce Insights Server Configuration:\n\
             - Bind: {}:{}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - Chat Database: {}\n\
             - Data Service: {}\n\
             - Chat Model: {} (timeout {}s, retries {})\n\
             - Company: {}\n\
             - History Limit: {}\n\
             - Leads Webhook: {}",
            self.host,
            self.http_port,
            self.environment,
            self.log_level,
            self.database.url,
            self.supabase.url,
            self.llm.model,
            self.llm.timeout_secs,
            self.llm.max_retries,
            self.chat.company_id,
            self.chat.history_limit,
            if self.operativo.leads_webhook_url.is_some() {
                "Enabled"
            } else {
                "Disabled"
            },
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn required_var(key: &str) -> Result<String> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("{key} must be set"))
}
