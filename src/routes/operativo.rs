// ABOUTME: Operational CRM route handlers for the leads webhook, lead merging, clients, and contact status
// ABOUTME: Proxies the automation webhook and joins its conversations with stored CRM contacts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use commerce_core::constants::{defaults, messages};
use commerce_core::errors::{AppError, AppResult};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::data::crm::{self, ContactStatusUpdate, ExportRow};
use crate::resources::ServerResources;

/// Operational CRM routes handler
pub struct OperativoRoutes;

impl OperativoRoutes {
    /// Create all operational routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/operativo", get(Self::webhook_proxy))
            .route("/api/operativo/leads", get(Self::leads))
            .route("/api/operativo/clientes", get(Self::clients))
            .route("/api/operativo/clientes/export", get(Self::clients_export))
            .route(
                "/api/operativo/contactos/estado",
                post(Self::set_contact_status),
            )
            .with_state(resources)
    }

    /// Raw payload of the leads webhook
    async fn webhook_proxy(State(resources): State<Arc<ServerResources>>) -> Response {
        match fetch_webhook(&resources).await {
            Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
            Err(e) => webhook_failure(&e),
        }
    }

    /// Webhook conversations joined with CRM contacts, excluding closed sales
    #[instrument(skip(resources))]
    async fn leads(State(resources): State<Arc<ServerResources>>) -> Result<Response, AppError> {
        let payload = match fetch_webhook(&resources).await {
            Ok(payload) => payload,
            Err(e) => return Ok(webhook_failure(&e)),
        };

        let conversations = crm::parse_webhook_conversations(&payload);
        let phones = crm::lead_phones(&conversations);
        let contacts = crm::contacts_by_phone(resources.rpc.as_ref(), &phones).await?;
        let leads = crm::merge_leads(&conversations, &contacts);
        info!(
            conversations = conversations.len(),
            leads = leads.len(),
            "Leads merged"
        );

        Ok((StatusCode::OK, Json(json!({ "leads": leads }))).into_response())
    }

    /// Contacts with a confirmed sale, most recently updated first
    async fn clients(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let clients =
            crm::list_clients(resources.rpc.as_ref(), Some(defaults::CLIENT_LIST_LIMIT)).await?;
        Ok((StatusCode::OK, Json(json!({ "clients": clients }))).into_response())
    }

    /// Every client plus spreadsheet-ready rows
    async fn clients_export(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let clients = crm::list_clients(resources.rpc.as_ref(), None).await?;
        let rows: Vec<ExportRow> = clients.iter().map(ExportRow::from).collect();
        Ok((
            StatusCode::OK,
            Json(json!({ "clients": clients, "rows": rows })),
        )
            .into_response())
    }

    /// Upsert a contact's call and sale flags
    #[instrument(skip(resources, update), fields(phone = %update.phone_number))]
    async fn set_contact_status(
        State(resources): State<Arc<ServerResources>>,
        Json(update): Json<ContactStatusUpdate>,
    ) -> Result<Response, AppError> {
        crm::set_contact_status(resources.rpc.as_ref(), &update).await?;
        Ok((StatusCode::OK, Json(json!({ "success": true })))
            .into_response())
    }
}

/// GET the configured leads webhook and return its JSON body
async fn fetch_webhook(resources: &ServerResources) -> AppResult<Value> {
    let url = resources
        .config
        .operativo
        .leads_webhook_url
        .as_deref()
        .ok_or_else(|| AppError::config("LEADS_WEBHOOK_URL is not configured"))?;

    let response = resources.http.get(url).send().await?;
    if !response.status().is_success() {
        return Err(AppError::external_service(
            "leads webhook",
            format!("status {}", response.status()),
        ));
    }
    Ok(response.json().await?)
}

fn webhook_failure(e: &AppError) -> Response {
    error!(error = %e, "Leads webhook request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": messages::WEBHOOK_UNREACHABLE })),
    )
        .into_response()
}
