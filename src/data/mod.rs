// ABOUTME: Data-access layer with one typed function per remote stored procedure
// ABOUTME: Translates flat parameter structs into fixed keyword-argument mappings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! # Data Access
//!
//! Each function calls exactly one stored procedure through an [`RpcClient`]
//! and returns its JSON verbatim. There are no retries and no caching, and
//! validation stops at defaults for missing values. Errors keep the upstream
//! message and details so route handlers can surface both.
//!
//! [`RpcClient`]: crate::rpc::RpcClient

/// CRM contacts and contact status updates
pub mod crm;
/// Date range parsing and defaults
pub mod dates;
/// Finance, product, and Pareto procedures
pub mod finanzas;
/// Meta Ads procedures
pub mod marketing;

pub use dates::DateRange;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Period a series or ranking is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// The immediately preceding period of equal length
    #[default]
    Prev,
    /// The same period one year earlier
    Yoy,
}

impl Comparison {
    /// Parse a query value; anything other than `yoy` compares with the previous period
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("yoy") => Self::Yoy,
            _ => Self::Prev,
        }
    }

    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prev => "prev",
            Self::Yoy => "yoy",
        }
    }
}

/// Company identifier as sent in `p_empresa`: numeric ids go out as numbers
#[must_use]
pub fn company_arg(company_id: Option<&str>) -> Value {
    match company_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id
            .parse::<i64>()
            .map_or_else(|_| Value::String(id.to_owned()), Value::from),
        None => Value::Null,
    }
}

/// Trim free text, turning blank input into `None`
#[must_use]
pub fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
