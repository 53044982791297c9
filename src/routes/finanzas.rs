// ABOUTME: Finance route handlers for product listings, KPIs, sales summary, series, and Pareto views
// ABOUTME: Parses dashboard query parameters and forwards them to the finance data functions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use commerce_core::constants::defaults;
use commerce_core::errors::AppError;
use commerce_core::pagination::PageRequest;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::data::dates::require_iso_date;
use crate::data::finanzas::{
    self, collection_effectiveness, listing_rows, ParetoQuery, ProductQuery, ProductTab,
};
use crate::data::{non_blank, Comparison, DateRange};
use crate::resources::ServerResources;

/// Query for the product listing
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub tab: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Query shared by the range-based finance views
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub compare: Option<String>,
}

impl RangeQuery {
    fn range_or(&self, fallback: DateRange) -> DateRange {
        DateRange::from_query(self.from.as_deref(), self.to.as_deref(), fallback)
    }

    fn comparison(&self) -> Comparison {
        Comparison::parse(self.compare.as_deref())
    }
}

/// Finance routes handler
pub struct FinanzasRoutes;

impl FinanzasRoutes {
    /// Create all finance routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/finanzas/productos", get(Self::productos))
            .route("/api/finanzas/productos/kpis", get(Self::productos_kpis))
            .route("/api/finanzas/resumen", get(Self::resumen))
            .route("/api/finanzas/ventas", get(Self::ventas))
            .route("/api/finanzas/pareto", get(Self::pareto))
            .with_state(resources)
    }

    /// One page of products ranked by revenue or units
    #[instrument(skip(resources))]
    async fn productos(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<ProductListQuery>,
    ) -> Result<Response, AppError> {
        let range = DateRange {
            from: require_iso_date("from", params.from.as_deref())?,
            to: require_iso_date("to", params.to.as_deref())?,
        };
        let tab = ProductTab::parse(params.tab.as_deref());
        let page = PageRequest::for_products(params.page.as_deref(), params.limit.as_deref());

        let query = ProductQuery {
            q: non_blank(params.q.as_deref()),
            limit: page.limit,
            offset: page.offset(),
            ..ProductQuery::new(range)
        };
        let result = finanzas::products_for_tab(resources.rpc.as_ref(), tab, &query).await?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "rows": listing_rows(&result),
                "page": page.page,
                "limit": page.limit,
            })),
        )
            .into_response())
    }

    /// Product page KPIs
    async fn productos_kpis(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<RangeQuery>,
    ) -> Result<Response, AppError> {
        let range =
            params.range_or(DateRange::trailing_from_today(defaults::TRAILING_RANGE_DAYS));
        let kpis = finanzas::product_kpis(resources.rpc.as_ref(), &range, None).await?;

        Ok((StatusCode::OK, Json(json!({ "range": range, "kpis": kpis }))).into_response())
    }

    /// Company KPIs with the collection effectiveness ratio
    async fn resumen(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<RangeQuery>,
    ) -> Result<Response, AppError> {
        let range =
            params.range_or(DateRange::trailing_from_today(defaults::FINANCE_SUMMARY_DAYS));
        let stats = finanzas::dashboard_stats(
            resources.rpc.as_ref(),
            &range,
            &resources.config.chat.company_id,
        )
        .await?;
        let efectividad = collection_effectiveness(&stats);

        Ok((
            StatusCode::OK,
            Json(json!({
                "range": range,
                "stats": stats,
                "efectividad": efectividad,
            })),
        )
            .into_response())
    }

    /// Daily sales against the comparison period, plus top payment methods
    async fn ventas(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<RangeQuery>,
    ) -> Result<Response, AppError> {
        let range =
            params.range_or(DateRange::trailing_from_today(defaults::TRAILING_RANGE_DAYS));
        let compare = params.comparison();

        let series =
            finanzas::sales_series_comparison(resources.rpc.as_ref(), &range, None, compare)
                .await?;

        let metodos = match finanzas::top_payment_methods(
            resources.rpc.as_ref(),
            &range,
            defaults::TOP_PAYMENT_METHODS_LIMIT,
        )
        .await
        {
            Ok(Value::Array(rows)) => Value::Array(rows),
            Ok(_) => json!([]),
            Err(e) => {
                warn!(error = %e, "Top payment methods unavailable");
                json!([])
            }
        };

        Ok((
            StatusCode::OK,
            Json(json!({
                "range": range,
                "compare": compare,
                "series": series,
                "topMetodosPago": metodos,
            })),
        )
            .into_response())
    }

    /// Full Pareto ranking plus class-A changes against the comparison period
    async fn pareto(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<RangeQuery>,
    ) -> Result<Response, AppError> {
        let range =
            params.range_or(DateRange::trailing_from_today(defaults::TRAILING_RANGE_DAYS));
        let compare = params.comparison();

        let query = ParetoQuery {
            only_80: false,
            ..ParetoQuery::new(range)
        };
        let pareto = finanzas::pareto_80(resources.rpc.as_ref(), &query).await?;
        let comparison =
            finanzas::pareto_comparison(resources.rpc.as_ref(), &range, None, compare).await?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "range": range,
                "compare": compare,
                "pareto": pareto,
                "comparison": comparison,
            })),
        )
            .into_response())
    }
}
