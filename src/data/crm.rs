// ABOUTME: CRM contact access, WhatsApp lead merging, and client export rows
// ABOUTME: Reads crm_contacts directly and updates contact status through a stored procedure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate};
use commerce_core::constants::{defaults, rpc as procedures, tables};
use commerce_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::rpc::{RpcArgs, RpcClient, TableQuery};

/// Row of `crm_contacts`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmContact {
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub llamada_por_tel: Option<bool>,
    pub venta: Option<bool>,
    pub conversation_id: Option<i64>,
    pub conversation_display_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Call/sale status change for a contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactStatusUpdate {
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub llamada_por_tel: Option<bool>,
    pub venta: Option<bool>,
    pub conversation_id: Option<i64>,
    pub conversation_display_id: Option<i64>,
}

impl ContactStatusUpdate {
    fn to_args(&self) -> RpcArgs {
        RpcArgs::new()
            .arg("p_phone", self.phone_number.trim())
            .opt("p_name", self.contact_name.clone())
            .opt("p_llamada", self.llamada_por_tel)
            .opt("p_venta", self.venta)
            .opt("p_conversation_id", self.conversation_id)
            .opt("p_conversation_display_id", self.conversation_display_id)
    }
}

/// Conversation reported by the leads webhook
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WebhookConversation {
    pub conversation_id: Option<i64>,
    pub conversation_display_id: Option<i64>,
    pub conversation_labels: Option<String>,
    pub contact_name: Option<String>,
    pub phone_number: Option<String>,
}

impl WebhookConversation {
    fn trimmed_phone(&self) -> Option<&str> {
        self.phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Contact that reached out and has not bought yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub conversation_id: Option<i64>,
    pub conversation_display_id: Option<i64>,
    pub contact_name: Option<String>,
    pub phone_number: String,
    pub conversation_labels: String,
    pub llamada_por_tel: bool,
    pub venta: bool,
}

/// Client row ready for spreadsheet export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Nombre")]
    pub nombre: String,
    #[serde(rename = "Teléfono")]
    pub telefono: String,
    #[serde(rename = "ID Conversación")]
    pub id_conversacion: String,
    #[serde(rename = "ID Display")]
    pub id_display: String,
    #[serde(rename = "Llamada Telefónica")]
    pub llamada_telefonica: String,
    #[serde(rename = "Venta Confirmada")]
    pub venta_confirmada: String,
    #[serde(rename = "Fecha de Creación")]
    pub fecha_creacion: String,
    #[serde(rename = "Última Actualización")]
    pub ultima_actualizacion: String,
}

impl From<&CrmContact> for ExportRow {
    fn from(contact: &CrmContact) -> Self {
        let id_or_dash = |id: Option<i64>| {
            id.filter(|v| *v != 0)
                .map_or_else(|| "-".to_owned(), |v| v.to_string())
        };
        let yes_no = |flag: Option<bool>| if flag.unwrap_or(false) { "Sí" } else { "No" };
        Self {
            nombre: contact
                .contact_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Sin nombre".to_owned()),
            telefono: contact.phone_number.clone(),
            id_conversacion: id_or_dash(contact.conversation_id),
            id_display: id_or_dash(contact.conversation_display_id),
            llamada_telefonica: yes_no(contact.llamada_por_tel).to_owned(),
            venta_confirmada: yes_no(contact.venta).to_owned(),
            fecha_creacion: display_date(contact.created_at.as_deref()),
            ultima_actualizacion: display_date(contact.updated_at.as_deref()),
        }
    }
}

/// Render a timestamp as a local `dd/mm/yyyy` date
fn display_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return "-".to_owned();
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Local).format("%d/%m/%Y").to_string();
    }
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map_or_else(|| "-".to_owned(), |d| d.format("%d/%m/%Y").to_string())
}

/// Split comma-separated labels and join them for display
#[must_use]
pub fn parse_labels(raw: Option<&str>) -> String {
    let labels: Vec<&str> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if labels.is_empty() {
        defaults::NO_LABEL.to_owned()
    } else {
        labels.join(defaults::LABEL_SEPARATOR)
    }
}

/// Extract conversations from the webhook payload `[{ "json": { ... } }]`
#[must_use]
pub fn parse_webhook_conversations(payload: &Value) -> Vec<WebhookConversation> {
    let Value::Array(items) = payload else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("json"))
        .filter_map(|json| serde_json::from_value(json.clone()).ok())
        .collect()
}

/// Phones worth looking up in the CRM
#[must_use]
pub fn lead_phones(conversations: &[WebhookConversation]) -> Vec<String> {
    conversations
        .iter()
        .filter_map(WebhookConversation::trimmed_phone)
        .map(str::to_owned)
        .collect()
}

/// Join webhook conversations with CRM state, dropping contacts that already bought
#[must_use]
pub fn merge_leads(conversations: &[WebhookConversation], contacts: &[CrmContact]) -> Vec<Lead> {
    let by_phone: HashMap<&str, &CrmContact> = contacts
        .iter()
        .map(|c| (c.phone_number.as_str(), c))
        .collect();

    conversations
        .iter()
        .filter_map(|conversation| {
            let phone = conversation.trimmed_phone()?;
            let known = by_phone.get(phone).copied();
            if known.and_then(|c| c.venta).unwrap_or(false) {
                return None;
            }
            Some(Lead {
                conversation_id: conversation.conversation_id,
                conversation_display_id: conversation.conversation_display_id,
                contact_name: known
                    .and_then(|c| c.contact_name.clone())
                    .or_else(|| conversation.contact_name.clone()),
                phone_number: phone.to_owned(),
                conversation_labels: parse_labels(conversation.conversation_labels.as_deref()),
                llamada_por_tel: known.and_then(|c| c.llamada_por_tel).unwrap_or(false),
                venta: false,
            })
        })
        .collect()
}

fn decode_contacts(rows: Vec<Value>) -> AppResult<Vec<CrmContact>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(AppError::from))
        .collect()
}

/// Upsert a contact's call/sale status
///
/// # Errors
///
/// Returns invalid input for a blank phone, or the upstream error from the procedure
#[instrument(skip(rpc, update), fields(phone = %update.phone_number))]
pub async fn set_contact_status(rpc: &dyn RpcClient, update: &ContactStatusUpdate) -> AppResult<()> {
    if update.phone_number.trim().is_empty() {
        return Err(AppError::missing_field("phone_number"));
    }
    rpc.call(procedures::CRM_SET_CONTACT_STATUS, &update.to_args())
        .await?;
    Ok(())
}

/// Contacts with a confirmed sale, most recently updated first
///
/// # Errors
///
/// Returns an upstream error if the table read fails
#[instrument(skip(rpc))]
pub async fn list_clients(rpc: &dyn RpcClient, limit: Option<u32>) -> AppResult<Vec<CrmContact>> {
    let mut query = TableQuery::select(tables::CRM_CONTACT_COLUMNS)
        .eq("venta", true)
        .order_desc("updated_at");
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    decode_contacts(rpc.select(tables::CRM_CONTACTS, &query).await?)
}

/// Contacts whose phone is in `phones`
///
/// # Errors
///
/// Returns an upstream error if the table read fails
#[instrument(skip(rpc, phones), fields(phones = phones.len()))]
pub async fn contacts_by_phone(rpc: &dyn RpcClient, phones: &[String]) -> AppResult<Vec<CrmContact>> {
    if phones.is_empty() {
        debug!("No phones to look up");
        return Ok(Vec::new());
    }
    let query = TableQuery::select(tables::CRM_CONTACT_COLUMNS).in_list("phone_number", phones);
    decode_contacts(rpc.select(tables::CRM_CONTACTS, &query).await?)
}
