// ABOUTME: HTTP tests for the Meta Ads marketing view against a scripted data service
// ABOUTME: Covers the summary series, ranking rows, threshold clamping, and prefixed upstream errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod helpers;

use commerce_insights_server::{constants::rpc as procedures, errors::AppError};
use common::create_test_app;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

#[tokio::test]
async fn test_resumen_splits_series() {
    let app = create_test_app().await.unwrap();
    app.rpc.respond(
        procedures::META_SUMMARY,
        json!([{"spend": 1200.5, "conversations_started": 40}]),
    );
    app.rpc.respond(
        procedures::META_TIMESERIES,
        json!([
            {"day": "2025-01-01", "spend_actual": 100, "spend_compare": "80.5", "cac_actual": 25, "cac_compare": null},
            {"day": "2025-01-02", "spend_actual": null, "spend_compare": 90, "cac_actual": null, "cac_compare": 30}
        ]),
    );

    let response =
        AxumTestRequest::get("/api/marketing?from=2025-01-01&to=2025-01-02&compare=yoy")
            .bearer(&app.token)
            .send(app.router())
            .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();

    assert_eq!(body["level"], "resumen");
    assert_eq!(body["compare"], "yoy");
    assert_eq!(body["summary"]["spend"], json!(1200.5));
    assert_eq!(
        body["seriesSpend"],
        json!([
            {"day": "2025-01-01", "actual": 100.0, "compare": 80.5},
            {"day": "2025-01-02", "actual": 0.0, "compare": 90.0}
        ])
    );
    assert_eq!(
        body["seriesCac"],
        json!([
            {"day": "2025-01-01", "actual": 25.0, "compare": null},
            {"day": "2025-01-02", "actual": null, "compare": 30.0}
        ])
    );
    assert!(body.get("rows").is_none());

    let calls = app.rpc.calls_to(procedures::META_TIMESERIES);
    assert_eq!(calls[0].get("p_compare"), Some(&json!("yoy")));
    assert_eq!(calls[0].get("p_conv_level"), Some(&json!("campaign")));
}

#[tokio::test]
async fn test_resumen_without_summary_row_is_null() {
    let app = create_test_app().await.unwrap();
    app.rpc.respond(procedures::META_SUMMARY, json!([]));

    let response = AxumTestRequest::get("/api/marketing")
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["summary"], Value::Null);
    assert_eq!(body["seriesSpend"], json!([]));
}

#[tokio::test]
async fn test_campaign_ranking_rows_and_clamped_thresholds() {
    let app = create_test_app().await.unwrap();
    app.rpc.respond(
        procedures::META_CAMPAIGN_RANKING,
        json!([{
            "campaign_id": 120_000_111,
            "campaign_name": "Verano",
            "spend": "450.25",
            "conversations_started": 9,
            "cac": 50.0,
            "ctr": null,
            "accion_recomendada": "ESCALAR",
            "motivo": "CAC bajo objetivo"
        }]),
    );

    let response = AxumTestRequest::get(
        "/api/marketing?level=campaign&from=2025-01-01&to=2025-01-31&cac=-10&ctr=150&limit=9999&minc=2",
    )
    .bearer(&app.token)
    .send(app.router())
    .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();

    assert_eq!(body["level"], "campaign");
    assert_eq!(
        body["thresholds"],
        json!({
            "cacObjetivo": 0.0,
            "ctrMin": 100.0,
            "freqMax": 3.0,
            "minConversations": 2,
            "limit": 500
        })
    );
    let row = &body["rows"][0];
    assert_eq!(row["id"], "120000111");
    assert_eq!(row["name"], "Verano");
    assert_eq!(row["spend"], json!(450.25));
    assert_eq!(row["conversations_started"], json!(9.0));
    assert!(row.get("conversations").is_none());
    assert_eq!(row["impressions"], json!(0.0));
    assert_eq!(row["ctr"], Value::Null);
    assert_eq!(row["accion_recomendada"], "ESCALAR");

    let calls = app.rpc.calls_to(procedures::META_CAMPAIGN_RANKING);
    assert_eq!(calls[0].get("p_limit"), Some(&json!(500)));
    assert_eq!(calls[0].get("p_min_conversations"), Some(&json!(2)));
    assert_eq!(calls[0].get("p_ctr_min"), Some(&json!(100.0)));
}

#[tokio::test]
async fn test_adset_ranking_defaults_unknown_action() {
    let app = create_test_app().await.unwrap();
    app.rpc.respond(
        procedures::META_ADSET_RANKING,
        json!([{"adset_id": "as-1", "adset_name": "Lookalike", "accion_recomendada": "DUPLICAR"}]),
    );

    let response = AxumTestRequest::get("/api/marketing?level=adset")
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["rows"][0]["id"], "as-1");
    assert_eq!(body["rows"][0]["accion_recomendada"], "MANTENER");
    assert!(app.rpc.calls_to(procedures::META_CAMPAIGN_RANKING).is_empty());
}

#[tokio::test]
async fn test_upstream_error_names_procedure() {
    let app = create_test_app().await.unwrap();
    app.rpc.fail(
        procedures::META_CAMPAIGN_RANKING,
        AppError::upstream("relation does not exist"),
    );

    let response = AxumTestRequest::get("/api/marketing?level=campaign")
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        format!("{}: relation does not exist", procedures::META_CAMPAIGN_RANKING)
    );
}
