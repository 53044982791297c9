// ABOUTME: Marketing route handler for the Meta Ads summary and campaign/ad-set rankings
// ABOUTME: Clamps ranking thresholds and echoes the effective query back with the data
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
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::data::marketing::{self, MetaLevel, MetaSeries, MetaThresholds};
use crate::data::{Comparison, DateRange};
use crate::resources::ServerResources;

/// Query for the marketing view
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MarketingQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub level: Option<String>,
    pub compare: Option<String>,
    pub cac: Option<String>,
    pub ctr: Option<String>,
    pub freq: Option<String>,
    pub minc: Option<String>,
    pub limit: Option<String>,
}

/// Marketing routes handler
pub struct MarketingRoutes;

impl MarketingRoutes {
    /// Create the marketing routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/marketing", get(Self::marketing))
            .with_state(resources)
    }

    #[instrument(skip(resources))]
    async fn marketing(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<MarketingQuery>,
    ) -> Result<Response, AppError> {
        let range = DateRange::from_query(
            params.from.as_deref(),
            params.to.as_deref(),
            DateRange::trailing_from_today(defaults::TRAILING_RANGE_DAYS),
        );
        let level = MetaLevel::parse(params.level.as_deref());
        let compare = Comparison::parse(params.compare.as_deref());
        let thresholds = MetaThresholds::from_query(
            params.cac.as_deref(),
            params.ctr.as_deref(),
            params.freq.as_deref(),
            params.minc.as_deref(),
            params.limit.as_deref(),
        );

        let rpc = resources.rpc.as_ref();
        let mut body = Map::new();
        body.insert("range".to_owned(), json!(range));
        body.insert("level".to_owned(), json!(level));
        body.insert("compare".to_owned(), json!(compare));
        body.insert("thresholds".to_owned(), json!(thresholds));

        match level {
            MetaLevel::Resumen => {
                let summary = marketing::meta_summary(rpc, &range).await?;
                let rows = marketing::meta_timeseries(rpc, &range, compare).await?;
                let series = MetaSeries::from_rows(&rows);
                body.insert("summary".to_owned(), summary.unwrap_or(Value::Null));
                body.insert("seriesSpend".to_owned(), json!(series.series_spend));
                body.insert("seriesCac".to_owned(), json!(series.series_cac));
            }
            MetaLevel::Campaign => {
                let rows = marketing::meta_campaign_ranking(rpc, &range, &thresholds).await?;
                body.insert("rows".to_owned(), json!(rows));
            }
            MetaLevel::Adset => {
                let rows = marketing::meta_adset_ranking(rpc, &range, &thresholds).await?;
                body.insert("rows".to_owned(), json!(rows));
            }
        }

        Ok((StatusCode::OK, Json(Value::Object(body))).into_response())
    }
}
