// ABOUTME: Shared server resources handed to every route group
// ABOUTME: Wires configuration, chat store, data client, model provider, and session checks together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use std::sync::Arc;
use std::time::Duration;

use commerce_core::errors::{AppError, AppResult};
use tracing::info;

use crate::auth::SupabaseAuth;
use crate::config::ServerConfig;
use crate::database::{ChatStore, Database};
use crate::llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use crate::rpc::{PostgrestClient, PostgrestConfig, RpcClient};
use crate::services::{ChatOrchestrator, ChatSettings};

/// Timeout for the leads webhook proxy
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything a request handler may need
///
/// Built once at startup and shared behind an `Arc`.
#[derive(Clone)]
pub struct ServerResources {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Chat database
    pub database: Database,
    /// Conversation and message operations
    pub chat_store: ChatStore,
    /// Remote data service
    pub rpc: Arc<dyn RpcClient>,
    /// Chat model provider
    pub llm: Arc<dyn LlmProvider>,
    /// Client for the leads webhook
    pub http: reqwest::Client,
    /// Session token validation
    pub auth: SupabaseAuth,
    /// Chat turn orchestration
    pub chat: ChatOrchestrator,
}

impl ServerResources {
    /// Assemble resources from already-built clients
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook HTTP client cannot be built
    pub fn new(
        config: ServerConfig,
        database: Database,
        rpc: Arc<dyn RpcClient>,
        llm: Arc<dyn LlmProvider>,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        let chat_store = database.chat();
        let chat = ChatOrchestrator::new(
            chat_store.clone(),
            Arc::clone(&rpc),
            Arc::clone(&llm),
            ChatSettings {
                company_id: config.chat.company_id.clone(),
                history_limit: config.chat.history_limit,
                model: config.llm.model.clone(),
            },
        );
        let auth = SupabaseAuth::new(&config.supabase.jwt_secret);

        Ok(Self {
            config: Arc::new(config),
            database,
            chat_store,
            rpc,
            llm,
            http,
            auth,
            chat,
        })
    }

    /// Open the database and connect the production clients described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or a client cannot be built
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database.url).await?;
        let rpc: Arc<dyn RpcClient> =
            Arc::new(PostgrestClient::new(PostgrestConfig::from(&config.supabase))?);
        let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatibleProvider::new(
            OpenAiCompatibleConfig::from(&config.llm),
        )?);

        info!(
            provider = llm.display_name(),
            model = %config.llm.model,
            "Server resources initialized"
        );
        Self::new(config, database, rpc, llm)
    }
}
