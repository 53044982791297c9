// ABOUTME: PostgREST client for Supabase stored procedures and table reads
// ABOUTME: Sends keyword arguments as JSON and maps error payloads to upstream AppErrors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use std::time::Duration;

use async_trait::async_trait;
use commerce_core::errors::{AppError, AppResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{ColumnFilter, RpcArgs, RpcClient, RpcError, TableQuery};
use crate::config::SupabaseConfig;

/// Connection timeout for the data service
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Request timeout for stored procedures (some aggregate large ranges)
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Characters of a non-JSON error body kept in error details
const ERROR_BODY_PREVIEW: usize = 300;

/// Configuration for [`PostgrestClient`]
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project base URL (without `/rest/v1`)
    pub base_url: String,
    /// Key sent as `apikey` and bearer token
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl From<&SupabaseConfig> for PostgrestConfig {
    fn from(config: &SupabaseConfig) -> Self {
        Self {
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// `PostgREST` implementation of [`RpcClient`]
#[derive(Clone)]
pub struct PostgrestClient {
    client: Client,
    config: PostgrestConfig,
}

impl PostgrestClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: PostgrestConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn rest_url(&self, path: &str) -> String {
        format!(
            "{}/rest/v1/{path}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    /// Turn a non-success response into an upstream error
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        match serde_json::from_str::<RpcError>(body) {
            Ok(payload) if !payload.message.is_empty() => payload.into_app_error(),
            _ => AppError::upstream(format!("Data service returned {status}"))
                .with_details(body.chars().take(ERROR_BODY_PREVIEW).collect::<String>()),
        }
    }

    async fn read_json(response: reqwest::Response) -> AppResult<Value> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(%status, "Data service request failed");
            return Err(Self::parse_error_response(status, &body));
        }

        // Void procedures answer with an empty body
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Render a table query as `PostgREST` query-string pairs
    fn query_pairs(query: &TableQuery) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_owned(), query.columns.clone())];
        for filter in &query.filters {
            match filter {
                ColumnFilter::Eq(column, value) => {
                    pairs.push((column.clone(), format!("eq.{value}")));
                }
                ColumnFilter::In(column, values) => {
                    let quoted: Vec<String> = values.iter().map(|v| quote_value(v)).collect();
                    pairs.push((column.clone(), format!("in.({})", quoted.join(","))));
                }
            }
        }
        if let Some((column, descending)) = &query.order {
            let direction = if *descending { "desc" } else { "asc" };
            pairs.push(("order".to_owned(), format!("{column}.{direction}")));
        }
        if let Some(limit) = query.limit {
            pairs.push(("limit".to_owned(), limit.to_string()));
        }
        pairs
    }
}

/// Quote a value for a `PostgREST` `in.(...)` list
fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[async_trait]
impl RpcClient for PostgrestClient {
    #[instrument(skip(self, args), fields(rpc = %procedure))]
    async fn call(&self, procedure: &str, args: &RpcArgs) -> AppResult<Value> {
        debug!(args = ?args.names().collect::<Vec<_>>(), "Calling stored procedure");
        let request = self
            .client
            .post(self.rest_url(&format!("rpc/{procedure}")))
            .json(args.as_map());
        let response = self.authorized(request).send().await?;
        Self::read_json(response).await
    }

    #[instrument(skip(self, query), fields(table = %table))]
    async fn select(&self, table: &str, query: &TableQuery) -> AppResult<Vec<Value>> {
        let request = self
            .client
            .get(self.rest_url(table))
            .query(&Self::query_pairs(query));
        let response = self.authorized(request).send().await?;
        match Self::read_json(response).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(AppError::upstream(format!(
                "Expected a row list from {table}, got {}",
                json_kind(&other)
            ))),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
