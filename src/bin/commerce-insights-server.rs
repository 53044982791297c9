// ABOUTME: Server binary for the commerce insights dashboard backend
// ABOUTME: Loads configuration, initializes logging and resources, and serves HTTP until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

#![recursion_limit = "256"]

//! # Commerce Insights Server Binary
//!
//! Starts the HTTP API for the dashboard: finance, marketing, and CRM views
//! plus the chat assistant.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use commerce_insights_server::{
    config::ServerConfig, logging, resources::ServerResources, server,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "commerce-insights-server")]
#[command(about = "Commerce Insights - business-intelligence API with a stats chat assistant")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Override the chat database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    logging::init(&config)?;
    config.warn_missing_integrations();

    info!("Starting Commerce Insights Server");
    info!("{}", config.summary());

    let resources = match ServerResources::from_config(config).await {
        Ok(resources) => Arc::new(resources),
        Err(e) => {
            error!(error = %e, "Failed to initialize server resources");
            return Err(e.into());
        }
    };

    server::run(resources).await
}
