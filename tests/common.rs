// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory stores, scripted data/model clients, session tokens, and app assembly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines
)]
//! Shared test utilities for `commerce_insights_server`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use commerce_insights_server::{
    auth::{SessionClaims, AUTHENTICATED_AUDIENCE},
    config::{
        ChatConfig, CorsConfig, DatabaseConfig, Environment, LlmConfig, LogLevel,
        OperativoConfig, ServerConfig, SupabaseConfig,
    },
    database::Database,
    errors::{AppError, AppResult},
    llm::{
        ChatRequest, ChatResponse, ChatResponseWithTools, LlmCapabilities, LlmProvider, Tool,
        ToolCallShape, TopLevelToolCall,
    },
    resources::ServerResources,
    rpc::{RpcArgs, RpcClient, TableQuery},
    server::build_router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

static INIT_LOGGER: Once = Once::new();

/// Secret used to sign session tokens in tests
pub const TEST_JWT_SECRET: &str = "integration-test-jwt-secret";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = std::env::var("TEST_LOG")
            .map_or(LogLevel::Warn, |raw| LogLevel::from_str_or_default(&raw))
            .to_tracing_level();

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration pointing at nothing real
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_owned(),
        http_port: 0,
        log_level: LogLevel::Warn,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: "sqlite::memory:".to_owned(),
        },
        supabase: SupabaseConfig {
            url: "http://127.0.0.1:9".to_owned(),
            api_key: "test-service-key".to_owned(),
            jwt_secret: TEST_JWT_SECRET.to_owned(),
        },
        llm: LlmConfig {
            base_url: "http://127.0.0.1:9/v1".to_owned(),
            api_key: None,
            model: "gpt-4o-mini".to_owned(),
            timeout_secs: 5,
            max_retries: 0,
        },
        chat: ChatConfig {
            company_id: "3526".to_owned(),
            history_limit: 30,
        },
        operativo: OperativoConfig {
            leads_webhook_url: None,
        },
        cors: CorsConfig {
            allowed_origins: "*".to_owned(),
        },
    }
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:").await?)
}

/// Sign a session token for `user_id` valid for one hour
pub fn mint_session_token(user_id: &str) -> String {
    let claims = SessionClaims {
        sub: user_id.to_owned(),
        exp: Utc::now().timestamp() + 3600,
        aud: AUTHENTICATED_AUDIENCE.to_owned(),
        email: Some(format!("{user_id}@example.com")),
        role: Some("authenticated".to_owned()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

// ============================================================================
// Mock data service
// ============================================================================

/// A stored-procedure call seen by [`MockRpcClient`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub procedure: String,
    pub args: RpcArgs,
}

/// Data service double: scripted per procedure/table, recording every call
#[derive(Default)]
pub struct MockRpcClient {
    procedures: Mutex<HashMap<String, AppResult<Value>>>,
    tables: Mutex<HashMap<String, AppResult<Vec<Value>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    selects: Mutex<Vec<(String, TableQuery)>>,
}

impl MockRpcClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `procedure` with `value` on every call
    pub fn respond(&self, procedure: &str, value: Value) {
        self.procedures
            .lock()
            .unwrap()
            .insert(procedure.to_owned(), Ok(value));
    }

    /// Fail every call to `procedure`
    pub fn fail(&self, procedure: &str, error: AppError) {
        self.procedures
            .lock()
            .unwrap()
            .insert(procedure.to_owned(), Err(error));
    }

    /// Answer reads of `table` with `rows`
    pub fn respond_table(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_owned(), Ok(rows));
    }

    /// Every procedure call so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Arguments of every call to `procedure`
    pub fn calls_to(&self, procedure: &str) -> Vec<RpcArgs> {
        self.calls()
            .into_iter()
            .filter(|call| call.procedure == procedure)
            .map(|call| call.args)
            .collect()
    }

    /// Every table read so far
    pub fn selects(&self) -> Vec<(String, TableQuery)> {
        self.selects.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcClient for MockRpcClient {
    async fn call(&self, procedure: &str, args: &RpcArgs) -> AppResult<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            procedure: procedure.to_owned(),
            args: args.clone(),
        });
        self.procedures
            .lock()
            .unwrap()
            .get(procedure)
            .cloned()
            .unwrap_or(Ok(Value::Null))
    }

    async fn select(&self, table: &str, query: &TableQuery) -> AppResult<Vec<Value>> {
        self.selects
            .lock()
            .unwrap()
            .push((table.to_owned(), query.clone()));
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ============================================================================
// Scripted model provider
// ============================================================================

/// Which provider entry point a request went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmCallKind {
    WithTools,
    Plain,
}

/// Model double answering from queues and recording every request
#[derive(Default)]
pub struct ScriptedLlmProvider {
    decisions: Mutex<VecDeque<AppResult<ChatResponseWithTools>>>,
    narratives: Mutex<VecDeque<AppResult<ChatResponse>>>,
    requests: Mutex<Vec<(LlmCallKind, ChatRequest)>>,
    text_only: AtomicBool,
}

impl ScriptedLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next decision-phase result
    pub fn push_decision(&self, result: AppResult<ChatResponseWithTools>) {
        self.decisions.lock().unwrap().push_back(result);
    }

    /// Queue the next narrative-phase result
    pub fn push_narrative(&self, result: AppResult<ChatResponse>) {
        self.narratives.lock().unwrap().push_back(result);
    }

    /// Report no tool-calling support from now on
    pub fn disable_tool_calls(&self) {
        self.text_only.store(true, Ordering::SeqCst);
    }

    /// Every request so far, in order
    pub fn requests(&self) -> Vec<(LlmCallKind, ChatRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

/// Decision reply with text only
pub fn text_reply(text: &str) -> ChatResponseWithTools {
    ChatResponseWithTools {
        content: Some(text.to_owned()),
        tool_calls: None,
        model: "gpt-4o-mini".to_owned(),
        usage: None,
        finish_reason: Some("stop".to_owned()),
    }
}

/// Decision reply calling `getStats` for the given range
pub fn stats_call(date_from: &str, date_to: &str) -> ChatResponseWithTools {
    ChatResponseWithTools {
        content: None,
        tool_calls: Some(ToolCallShape::TopLevel(vec![TopLevelToolCall {
            tool_name: "getStats".to_owned(),
            args: Some(json!({ "dateFrom": date_from, "dateTo": date_to })),
            input: None,
            tool_call_id: Some("call_1".to_owned()),
            id: None,
        }])),
        model: "gpt-4o-mini".to_owned(),
        usage: None,
        finish_reason: Some("tool_calls".to_owned()),
    }
}

/// Narrative reply
pub fn narrative(text: &str) -> ChatResponse {
    ChatResponse {
        content: text.to_owned(),
        model: "gpt-4o-mini".to_owned(),
        usage: None,
        finish_reason: Some("stop".to_owned()),
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted Test Provider"
    }

    fn capabilities(&self) -> LlmCapabilities {
        if self.text_only.load(Ordering::SeqCst) {
            LlmCapabilities::SYSTEM_MESSAGES
        } else {
            LlmCapabilities::TOOL_CALLS | LlmCapabilities::SYSTEM_MESSAGES
        }
    }

    fn default_model(&self) -> &str {
        "gpt-4o-mini"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests
            .lock()
            .unwrap()
            .push((LlmCallKind::Plain, request.clone()));
        self.narratives
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::internal("No scripted narrative")))
    }

    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        _tools: &[Tool],
    ) -> Result<ChatResponseWithTools, AppError> {
        self.requests
            .lock()
            .unwrap()
            .push((LlmCallKind::WithTools, request.clone()));
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::internal("No scripted decision")))
    }
}

// ============================================================================
// Application assembly
// ============================================================================

/// Server resources wired to the doubles above
pub struct TestApp {
    pub resources: Arc<ServerResources>,
    pub rpc: Arc<MockRpcClient>,
    pub llm: Arc<ScriptedLlmProvider>,
    pub token: String,
}

impl TestApp {
    /// Full router, including the session guard
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.resources))
    }
}

/// Build a test app from `config`
pub async fn create_test_app_with_config(config: ServerConfig) -> Result<TestApp> {
    init_test_logging();
    let database = Database::new(&config.database.url).await?;
    let rpc = Arc::new(MockRpcClient::new());
    let llm = Arc::new(ScriptedLlmProvider::new());

    let resources = ServerResources::new(
        config,
        database,
        Arc::clone(&rpc) as Arc<dyn RpcClient>,
        Arc::clone(&llm) as Arc<dyn LlmProvider>,
    )?;

    Ok(TestApp {
        resources: Arc::new(resources),
        rpc,
        llm,
        token: mint_session_token("user-1"),
    })
}

/// Build a test app with the default test configuration
pub async fn create_test_app() -> Result<TestApp> {
    create_test_app_with_config(test_config()).await
}

/// A `get_dashboard_stats` payload with 12 products and 7 days of series
pub fn sample_dashboard_stats() -> Value {
    let productos: Vec<Value> = (1..=12)
        .map(|i| {
            json!({
                "nombre": format!("Producto {i}"),
                "unidades": 100 - i,
                "venta_total": 1000.0 / f64::from(i),
            })
        })
        .collect();
    let ventas: Vec<Value> = (1..=7)
        .map(|d| json!({ "fecha": format!("2025-01-0{d}"), "ventas": f64::from(d % 4) * 100.0 }))
        .collect();
    let pagos: Vec<Value> = (1..=7)
        .map(|d| json!({ "fecha": format!("2025-01-0{d}"), "pagos": f64::from(d) * 10.0 }))
        .collect();

    json!({
        "range": { "from": "2025-01-01", "to": "2025-01-31" },
        "kpis": {
            "total_ventas": 125_000.456,
            "total_pagos": 100_000,
            "ticket_promedio": 1234.5678,
            "cantidad_facturas": 101,
            "clientes": 42
        },
        "top": { "productos": productos },
        "series": { "ventas_por_dia": ventas, "pagos_por_dia": pagos }
    })
}
