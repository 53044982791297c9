// ABOUTME: Tracing subscriber setup for the dashboard API driven by the loaded server configuration
// ABOUTME: Picks the output format, quiets dependency targets, and logs a startup banner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! Structured logging.
//!
//! Level and environment come from [`ServerConfig`]; `RUST_LOG`, when set,
//! replaces the base filter entirely. Production output is JSON with source
//! locations and span close events.

use std::env;
use std::io;

use anyhow::Result;
use commerce_core::constants::service_names;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{Environment, LogLevel, ServerConfig};

/// Targets held at a fixed level regardless of the configured one
const QUIET_TARGETS: &[(&str, &str)] = &[
    ("hyper", "warn"),
    ("reqwest", "warn"),
    ("sqlx", "warn"),
    ("tower_http", "info"),
];

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    /// `LOG_FORMAT` wins; otherwise production logs JSON
    fn resolve(explicit: Option<&str>, environment: Environment) -> Self {
        match explicit.map(str::to_lowercase).as_deref() {
            Some("json") => Self::Json,
            Some("compact") => Self::Compact,
            Some("pretty") => Self::Pretty,
            _ if environment.is_production() => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Subscriber settings derived from [`ServerConfig`]
#[derive(Debug, Clone)]
pub struct LoggingSetup {
    pub level: LogLevel,
    pub format: LogFormat,
    pub environment: Environment,
    /// File, line, and span close events
    pub verbose: bool,
}

impl LoggingSetup {
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        let format = LogFormat::resolve(env::var("LOG_FORMAT").ok().as_deref(), config.environment);
        Self {
            level: config.log_level,
            format,
            environment: config.environment,
            verbose: config.environment.is_production() || env::var("LOG_VERBOSE").is_ok(),
        }
    }

    /// Filter for `base`, followed by the quiet targets and this crate's level
    #[must_use]
    pub fn filter_for(&self, base: &str) -> EnvFilter {
        let directives = QUIET_TARGETS
            .iter()
            .map(|(target, level)| format!("{target}={level}"))
            .chain(std::iter::once(format!(
                "commerce_insights_server={}",
                self.level
            )));
        directives.fold(EnvFilter::new(base), |filter, directive| {
            match directive.parse() {
                Ok(parsed) => filter.add_directive(parsed),
                Err(_) => filter,
            }
        })
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let base = env::var("RUST_LOG").unwrap_or_else(|_| self.level.to_string());
        let registry = tracing_subscriber::registry().with(self.filter_for(&base));
        let span_events = if self.verbose {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_file(self.verbose)
                        .with_line_number(self.verbose)
                        .with_span_events(span_events)
                        .with_writer(io::stdout),
                )
                .try_init()?,
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .with_file(self.verbose)
                        .with_line_number(self.verbose)
                        .with_span_events(span_events)
                        .with_writer(io::stdout),
                )
                .try_init()?,
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_target(false).with_writer(io::stdout))
                .try_init()?,
        }

        info!(
            service = service_names::COMMERCE_INSIGHTS_SERVER,
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            level = %self.level,
            format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Install logging for a loaded configuration
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &ServerConfig) -> Result<()> {
    LoggingSetup::from_config(config).init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_environment_unless_overridden() {
        assert_eq!(
            LogFormat::resolve(None, Environment::Production),
            LogFormat::Json
        );
        assert_eq!(
            LogFormat::resolve(None, Environment::Development),
            LogFormat::Pretty
        );
        assert_eq!(
            LogFormat::resolve(Some("COMPACT"), Environment::Production),
            LogFormat::Compact
        );
        assert_eq!(
            LogFormat::resolve(Some("pretty"), Environment::Production),
            LogFormat::Pretty
        );
    }

    #[test]
    fn filter_quiets_dependencies() {
        let setup = LoggingSetup {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            environment: Environment::Development,
            verbose: false,
        };
        let rendered = setup.filter_for("info").to_string();
        assert!(rendered.contains("hyper=warn"));
        assert!(rendered.contains("sqlx=warn"));
        assert!(rendered.contains("commerce_insights_server=debug"));
    }
}
