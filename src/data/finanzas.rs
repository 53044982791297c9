// ABOUTME: Finance data access for dashboard KPIs, sales series, products, and Pareto analysis
// ABOUTME: One function per stored procedure with the procedure's fixed keyword arguments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use commerce_core::constants::{defaults, rpc as procedures};
use commerce_core::errors::AppResult;
use serde_json::Value;
use tracing::instrument;

use super::{company_arg, Comparison, DateRange};
use crate::rpc::{RpcArgs, RpcClient};

/// Which product ranking a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductTab {
    /// Ranked by revenue
    #[default]
    Facturacion,
    /// Ranked by units sold
    Unidades,
}

impl ProductTab {
    /// Parse a query value; anything other than `unidades` ranks by revenue
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("unidades") => Self::Unidades,
            _ => Self::Facturacion,
        }
    }

    /// Stored procedure backing this tab
    #[must_use]
    pub const fn procedure(self) -> &'static str {
        match self {
            Self::Facturacion => procedures::PRODUCT_REVENUE,
            Self::Unidades => procedures::TOP_PRODUCTS_UNITS,
        }
    }
}

/// Paged, filtered product query
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    /// Date range
    pub range: DateRange,
    /// Company filter (`None` = all companies)
    pub company_id: Option<String>,
    /// Exact SKU filter
    pub sku: Option<String>,
    /// Free-text search
    pub q: Option<String>,
    /// Page size
    pub limit: u32,
    /// Rows skipped
    pub offset: u64,
}

impl ProductQuery {
    /// First page of all products in `range`
    #[must_use]
    pub const fn new(range: DateRange) -> Self {
        Self {
            range,
            company_id: None,
            sku: None,
            q: None,
            limit: defaults::PRODUCT_PAGE_SIZE,
            offset: 0,
        }
    }

    fn to_args(&self) -> RpcArgs {
        RpcArgs::new()
            .arg("p_from", self.range.from_iso())
            .arg("p_to", self.range.to_iso())
            .arg("p_empresa", company_arg(self.company_id.as_deref()))
            .opt("p_sku", self.sku.clone())
            .opt("p_q", self.q.clone())
            .arg("p_limit", self.limit)
            .arg("p_offset", self.offset)
    }
}

/// Pareto class-A query
#[derive(Debug, Clone, PartialEq)]
pub struct ParetoQuery {
    /// Date range
    pub range: DateRange,
    /// Company filter
    pub company_id: Option<String>,
    /// Cumulative-share threshold
    pub threshold: f64,
    /// Only return class-A rows
    pub only_80: bool,
    /// Row cap
    pub limit: u32,
}

impl ParetoQuery {
    /// Defaults: 80% threshold, class-A rows only, 200 rows
    #[must_use]
    pub const fn new(range: DateRange) -> Self {
        Self {
            range,
            company_id: None,
            threshold: defaults::PARETO_THRESHOLD,
            only_80: true,
            limit: defaults::PARETO_LIMIT,
        }
    }
}

fn range_args(range: &DateRange, company_id: Option<&str>) -> RpcArgs {
    RpcArgs::new()
        .arg("p_from", range.from_iso())
        .arg("p_to", range.to_iso())
        .arg("p_empresa", company_arg(company_id))
}

/// KPIs, daily sales/payment series, and top products for a company
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
#[instrument(skip(rpc))]
pub async fn dashboard_stats(
    rpc: &dyn RpcClient,
    range: &DateRange,
    company_id: &str,
) -> AppResult<Value> {
    rpc.call(procedures::DASHBOARD_STATS, &range_args(range, Some(company_id)))
        .await
}

/// Daily sales against the previous period or the same period last year
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
#[instrument(skip(rpc))]
pub async fn sales_series_comparison(
    rpc: &dyn RpcClient,
    range: &DateRange,
    company_id: Option<&str>,
    comparison: Comparison,
) -> AppResult<Value> {
    let procedure = match comparison {
        Comparison::Prev => procedures::DAILY_SALES_PREV,
        Comparison::Yoy => procedures::DAILY_SALES_YOY,
    };
    rpc.call(procedure, &range_args(range, company_id)).await
}

/// Revenue per product
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
pub async fn product_revenue(rpc: &dyn RpcClient, query: &ProductQuery) -> AppResult<Value> {
    products_for_tab(rpc, ProductTab::Facturacion, query).await
}

/// Units sold per product
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
pub async fn top_products_by_units(
    rpc: &dyn RpcClient,
    query: &ProductQuery,
) -> AppResult<Value> {
    products_for_tab(rpc, ProductTab::Unidades, query).await
}

/// Product listing for the given tab
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
#[instrument(skip(rpc, query), fields(from = %query.range.from, to = %query.range.to, limit = query.limit, offset = query.offset))]
pub async fn products_for_tab(
    rpc: &dyn RpcClient,
    tab: ProductTab,
    query: &ProductQuery,
) -> AppResult<Value> {
    rpc.call(tab.procedure(), &query.to_args()).await
}

/// Product page KPIs
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
#[instrument(skip(rpc))]
pub async fn product_kpis(
    rpc: &dyn RpcClient,
    range: &DateRange,
    company_id: Option<&str>,
) -> AppResult<Value> {
    let args = RpcArgs::new()
        .arg("p_empresa", company_arg(company_id))
        .arg("p_from", range.from_iso())
        .arg("p_to", range.to_iso());
    rpc.call(procedures::PRODUCT_KPIS, &args).await
}

/// Pareto class-A products
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
#[instrument(skip(rpc))]
pub async fn pareto_80(rpc: &dyn RpcClient, query: &ParetoQuery) -> AppResult<Value> {
    let args = range_args(&query.range, query.company_id.as_deref())
        .arg("p_umbral", query.threshold)
        .arg("p_only_80", query.only_80)
        .arg("p_limit", query.limit);
    rpc.call(procedures::PARETO_80, &args).await
}

/// Products entering, leaving, and staying in class A against a comparison period
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
#[instrument(skip(rpc))]
pub async fn pareto_comparison(
    rpc: &dyn RpcClient,
    range: &DateRange,
    company_id: Option<&str>,
    comparison: Comparison,
) -> AppResult<Value> {
    let procedure = match comparison {
        Comparison::Prev => procedures::PARETO_PREV,
        Comparison::Yoy => procedures::PARETO_YOY,
    };
    let args = range_args(range, company_id)
        .arg("p_umbral", defaults::PARETO_THRESHOLD)
        .arg("p_limit_changes", defaults::PARETO_CHANGES_LIMIT);
    rpc.call(procedure, &args).await
}

/// Most used payment methods
///
/// # Errors
///
/// Returns an upstream error if the procedure call fails
#[instrument(skip(rpc))]
pub async fn top_payment_methods(
    rpc: &dyn RpcClient,
    range: &DateRange,
    limit: u32,
) -> AppResult<Value> {
    let args = RpcArgs::new()
        .arg("p_from", range.from_iso())
        .arg("p_to", range.to_iso())
        .arg("p_limit", limit);
    rpc.call(procedures::TOP_PAYMENT_METHODS, &args).await
}

/// `rows` of a listing result, or an empty list when the procedure omitted them
#[must_use]
pub fn listing_rows(result: &Value) -> Value {
    match result.get("rows") {
        Some(rows @ Value::Array(_)) => rows.clone(),
        _ => Value::Array(Vec::new()),
    }
}

/// Share of invoiced sales already collected, as a percentage
#[must_use]
pub fn collection_effectiveness(stats: &Value) -> f64 {
    let kpis = stats.get("kpis");
    let number = |key: &str| {
        kpis.and_then(|k| k.get(key))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    };
    let sales = number("total_ventas");
    if sales > 0.0 {
        number("total_pagos") / sales * 100.0
    } else {
        0.0
    }
}
