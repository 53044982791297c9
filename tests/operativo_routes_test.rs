// ABOUTME: HTTP tests for the operational CRM routes with a local fake leads webhook
// ABOUTME: Covers webhook proxying, lead merging, client listing and export, and contact status updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod helpers;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use commerce_insights_server::{
    constants::{messages, rpc as procedures, tables},
    rpc::ColumnFilter,
};
use common::{create_test_app, create_test_app_with_config, test_config, TestApp};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL
async fn spawn_fake(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn app_with_webhook(payload: Value) -> TestApp {
    let router = Router::new().route(
        "/webhook/leads",
        get(move || {
            let payload = payload.clone();
            async move { Json(payload) }
        }),
    );
    let base = spawn_fake(router).await;
    let mut config = test_config();
    config.operativo.leads_webhook_url = Some(format!("{base}/webhook/leads"));
    create_test_app_with_config(config).await.unwrap()
}

fn webhook_payload() -> Value {
    json!([
        {"json": {
            "conversation_id": 101,
            "conversation_display_id": 7,
            "conversation_labels": "nuevo,mayorista",
            "contact_name": "Ana (WhatsApp)",
            "phone_number": " +5491100000001 "
        }},
        {"json": {
            "conversation_id": 102,
            "conversation_display_id": 8,
            "conversation_labels": null,
            "contact_name": "Beto",
            "phone_number": "+5491100000002"
        }},
        {"json": {
            "conversation_id": 103,
            "contact_name": "Sin teléfono",
            "phone_number": "   "
        }}
    ])
}

#[tokio::test]
async fn test_webhook_proxy_returns_payload() {
    let app = app_with_webhook(webhook_payload()).await;

    let response = AxumTestRequest::get("/api/operativo")
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body, webhook_payload());
}

#[tokio::test]
async fn test_unconfigured_webhook_is_server_error() {
    let app = create_test_app().await.unwrap();

    for uri in ["/api/operativo", "/api/operativo/leads"] {
        let response = AxumTestRequest::get(uri)
            .bearer(&app.token)
            .send(app.router())
            .await;
        assert_eq!(response.status(), 500, "{uri}");
        let body: Value = response.json();
        assert_eq!(body, json!({"error": messages::WEBHOOK_UNREACHABLE}));
    }
}

#[tokio::test]
async fn test_failing_webhook_is_server_error() {
    let router = Router::new().route(
        "/webhook/leads",
        get(|| async { (StatusCode::BAD_GATEWAY, "down") }),
    );
    let base = spawn_fake(router).await;
    let mut config = test_config();
    config.operativo.leads_webhook_url = Some(format!("{base}/webhook/leads"));
    let app = create_test_app_with_config(config).await.unwrap();

    let response = AxumTestRequest::get("/api/operativo/leads")
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(response.status(), 500);
    assert!(app.rpc.selects().is_empty());
}

#[tokio::test]
async fn test_leads_merge_crm_state_and_drop_sales() {
    let app = app_with_webhook(webhook_payload()).await;
    app.rpc.respond_table(
        tables::CRM_CONTACTS,
        vec![
            json!({
                "phone_number": "+5491100000001",
                "contact_name": "Ana García",
                "llamada_por_tel": true,
                "venta": false
            }),
            json!({
                "phone_number": "+5491100000002",
                "contact_name": "Beto",
                "llamada_por_tel": true,
                "venta": true
            }),
        ],
    );

    let response = AxumTestRequest::get("/api/operativo/leads")
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(
        body["leads"],
        json!([{
            "conversation_id": 101,
            "conversation_display_id": 7,
            "contact_name": "Ana García",
            "phone_number": "+5491100000001",
            "conversation_labels": "nuevo · mayorista",
            "llamada_por_tel": true,
            "venta": false
        }])
    );

    let selects = app.rpc.selects();
    assert_eq!(selects.len(), 1);
    assert_eq!(selects[0].0, tables::CRM_CONTACTS);
    assert_eq!(
        selects[0].1.filters,
        vec![ColumnFilter::In(
            "phone_number".to_owned(),
            vec!["+5491100000001".to_owned(), "+5491100000002".to_owned()]
        )]
    );
}

#[tokio::test]
async fn test_clients_list_is_capped() {
    let app = create_test_app().await.unwrap();
    app.rpc.respond_table(
        tables::CRM_CONTACTS,
        vec![json!({"phone_number": "+549110", "contact_name": "Carla", "venta": true})],
    );

    let response = AxumTestRequest::get("/api/operativo/clientes")
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["clients"][0]["contact_name"], "Carla");

    let selects = app.rpc.selects();
    assert_eq!(selects[0].1.limit, Some(500));
    assert_eq!(selects[0].1.order, Some(("updated_at".to_owned(), true)));
    assert_eq!(
        selects[0].1.filters,
        vec![ColumnFilter::Eq("venta".to_owned(), "true".to_owned())]
    );
}

#[tokio::test]
async fn test_clients_export_rows() {
    let app = create_test_app().await.unwrap();
    app.rpc.respond_table(
        tables::CRM_CONTACTS,
        vec![json!({
            "phone_number": "+549110",
            "contact_name": null,
            "llamada_por_tel": false,
            "venta": true,
            "conversation_id": 55,
            "conversation_display_id": 0,
            "created_at": null,
            "updated_at": "2025-03-04"
        })],
    );

    let response = AxumTestRequest::get("/api/operativo/clientes/export")
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["clients"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["rows"][0],
        json!({
            "Nombre": "Sin nombre",
            "Teléfono": "+549110",
            "ID Conversación": "55",
            "ID Display": "-",
            "Llamada Telefónica": "No",
            "Venta Confirmada": "Sí",
            "Fecha de Creación": "-",
            "Última Actualización": "04/03/2025"
        })
    );
    assert_eq!(app.rpc.selects()[0].1.limit, None);
}

#[tokio::test]
async fn test_set_contact_status() {
    let app = create_test_app().await.unwrap();

    let response = AxumTestRequest::post("/api/operativo/contactos/estado")
        .bearer(&app.token)
        .json(&json!({"phone_number": " +549110 ", "venta": true}))
        .send(app.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body, json!({"success": true}));

    let calls = app.rpc.calls_to(procedures::CRM_SET_CONTACT_STATUS);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].get("p_phone"), Some(&json!("+549110")));
    assert_eq!(calls[0].get("p_venta"), Some(&json!(true)));
    assert_eq!(calls[0].get("p_llamada"), Some(&Value::Null));

    let response = AxumTestRequest::post("/api/operativo/contactos/estado")
        .bearer(&app.token)
        .json(&json!({"phone_number": "  ", "venta": true}))
        .send(app.router())
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(app.rpc.calls_to(procedures::CRM_SET_CONTACT_STATUS).len(), 1);
}
