// ABOUTME: Remote data service abstraction for stored-procedure calls and table reads
// ABOUTME: Defines the RpcClient trait, keyword-argument builder, and upstream error payload
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! # Remote Data Service
//!
//! All business numbers come from stored procedures in the remote database.
//! This module hides the transport behind [`RpcClient`] so the data layer only
//! deals with procedure names and keyword arguments.
//!
//! - **`RpcArgs`**: keyword-argument map sent as the JSON request body
//! - **`TableQuery`**: filter/order/limit description for direct table reads
//! - **`RpcError`**: the `{ message, details, hint, code }` payload the service
//!   returns on failure

mod postgrest;

pub use postgrest::{PostgrestClient, PostgrestConfig};

use async_trait::async_trait;
use commerce_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keyword arguments for a stored-procedure call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RpcArgs(Map<String, Value>);

impl RpcArgs {
    /// Empty argument map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument
    #[must_use]
    pub fn arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_owned(), value.into());
        self
    }

    /// Add an optional argument, sending `null` when absent
    #[must_use]
    pub fn opt<T: Into<Value>>(self, name: &str, value: Option<T>) -> Self {
        self.arg(name, value.map_or(Value::Null, Into::into))
    }

    /// Look up an argument by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Argument names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Borrow as a JSON object
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Filter applied to a table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    /// `column = value`
    Eq(String, String),
    /// `column IN (values...)`
    In(String, Vec<String>),
}

/// Direct table read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    /// Comma-separated column list
    pub columns: String,
    /// Filters combined with AND
    pub filters: Vec<ColumnFilter>,
    /// Ordering column and direction (`true` = descending)
    pub order: Option<(String, bool)>,
    /// Row cap
    pub limit: Option<u32>,
}

impl TableQuery {
    /// Select the given columns
    #[must_use]
    pub fn select(columns: &str) -> Self {
        Self {
            columns: columns.to_owned(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Require `column = value`
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push(ColumnFilter::Eq(column.to_owned(), value.to_string()));
        self
    }

    /// Require `column` to be one of `values`
    #[must_use]
    pub fn in_list(mut self, column: &str, values: &[String]) -> Self {
        self.filters
            .push(ColumnFilter::In(column.to_owned(), values.to_vec()));
        self
    }

    /// Order by `column` descending
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some((column.to_owned(), true));
        self
    }

    /// Cap the number of rows
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Error payload returned by the remote data service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Short message
    #[serde(default)]
    pub message: String,
    /// Extended details
    #[serde(default)]
    pub details: Option<String>,
    /// Hint from the database
    #[serde(default)]
    pub hint: Option<String>,
    /// SQLSTATE or service error code
    #[serde(default)]
    pub code: Option<String>,
}

impl RpcError {
    /// Convert into an upstream `AppError` carrying message and details
    #[must_use]
    pub fn into_app_error(self) -> AppError {
        let err = AppError::upstream(self.message);
        match self.details {
            Some(details) => err.with_details(details),
            None => err,
        }
    }
}

/// Client for the remote data service
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Call a stored procedure with keyword arguments and return its JSON result verbatim
    async fn call(&self, procedure: &str, args: &RpcArgs) -> AppResult<Value>;

    /// Read rows from a table
    async fn select(&self, table: &str, query: &TableQuery) -> AppResult<Vec<Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_keep_nulls_for_missing_options() {
        let args = RpcArgs::new()
            .arg("p_from", "2025-01-01")
            .opt::<String>("p_q", None)
            .arg("p_limit", 20);
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({"p_from": "2025-01-01", "p_q": null, "p_limit": 20})
        );
        assert_eq!(args.names().collect::<Vec<_>>().len(), 3);
    }

    #[test]
    fn rpc_error_keeps_details() {
        let err: RpcError = serde_json::from_value(json!({
            "message": "function not found",
            "details": "Searched for get_x(p_from)",
            "hint": null,
            "code": "PGRST202"
        }))
        .unwrap();
        let app = err.into_app_error();
        assert_eq!(app.http_status(), 400);
        assert_eq!(app.details.as_deref(), Some("Searched for get_x(p_from)"));
    }

    #[test]
    fn table_query_builder() {
        let query = TableQuery::select("phone_number")
            .eq("venta", true)
            .order_desc("updated_at")
            .limit(500);
        assert_eq!(
            query.filters,
            vec![ColumnFilter::Eq("venta".into(), "true".into())]
        );
        assert_eq!(query.order, Some(("updated_at".into(), true)));
        assert_eq!(query.limit, Some(500));
    }
}
