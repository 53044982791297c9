// ABOUTME: The getStats tool offered to the chat model and the summary it returns
// ABOUTME: Builds KPIs, top products, and best days from dashboard stats and renders them as plain text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! # Statistics Tool
//!
//! The model may call `getStats(dateFrom, dateTo)` during the decision phase.
//! The tool fetches dashboard stats for the configured company, keeps the
//! parts worth discussing, and hands back a [`StatsSummary`]. Failures never
//! surface to the model: they are logged and the turn carries on without data.

use std::cmp::Ordering;

use commerce_core::constants::chat::{BEST_DAYS, STATS_TOOL_NAME, TOP_PRODUCTS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};

use crate::data::dates::parse_iso_date;
use crate::data::{finanzas, DateRange};
use crate::llm::{FunctionDeclaration, Tool};
use crate::rpc::RpcClient;

const TOOL_DESCRIPTION: &str = "Obtiene estadísticas de la empresa: KPIs, top productos y series de ventas/pagos en un rango de fechas";

/// Arguments the model passes to `getStats`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsArgs {
    pub date_from: String,
    pub date_to: String,
}

/// Product line in the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub nombre: Value,
    pub unidades: Value,
    /// Revenue with two decimals
    pub venta_total: String,
}

/// Best days by sales and by payments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestDays {
    pub sales: Vec<Value>,
    pub payments: Vec<Value>,
}

/// What `getStats` returns to the chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub kpis: Map<String, Value>,
    pub range: Value,
    pub top_products: Vec<TopProduct>,
    pub best_days: BestDays,
}

/// Tool declaration offered in the decision phase
#[must_use]
pub fn stats_tool() -> Tool {
    Tool {
        function_declarations: vec![FunctionDeclaration {
            name: STATS_TOOL_NAME.to_owned(),
            description: TOOL_DESCRIPTION.to_owned(),
            parameters: Some(json!({
                "type": "object",
                "properties": {
                    "dateFrom": {"type": "string", "minLength": 10, "maxLength": 10},
                    "dateTo": {"type": "string", "minLength": 10, "maxLength": 10}
                },
                "required": ["dateFrom", "dateTo"],
                "additionalProperties": false
            })),
        }],
    }
}

/// Run the tool for the model's arguments, or `None` when there is nothing to report
#[instrument(skip(rpc, args))]
pub async fn run_stats_tool(
    rpc: &dyn RpcClient,
    company_id: &str,
    args: &Value,
) -> Option<StatsSummary> {
    let range = match parse_args(args) {
        Ok(range) => range,
        Err(reason) => {
            warn!(tool = STATS_TOOL_NAME, %reason, "Rejected tool arguments");
            return None;
        }
    };

    match finanzas::dashboard_stats(rpc, &range, company_id).await {
        Ok(Value::Null) => {
            warn!(tool = STATS_TOOL_NAME, "Dashboard stats returned no data");
            None
        }
        Ok(stats) => {
            let summary = StatsSummary::from_stats(&stats);
            debug!(
                products = summary.top_products.len(),
                "Built statistics summary"
            );
            Some(summary)
        }
        Err(e) => {
            warn!(tool = STATS_TOOL_NAME, error = %e, "Dashboard stats failed");
            None
        }
    }
}

fn parse_args(args: &Value) -> Result<DateRange, String> {
    let args: StatsArgs =
        serde_json::from_value(args.clone()).map_err(|e| format!("malformed arguments: {e}"))?;
    let from = parse_iso_date(&args.date_from)
        .ok_or_else(|| format!("dateFrom is not YYYY-MM-DD: {}", args.date_from))?;
    let to = parse_iso_date(&args.date_to)
        .ok_or_else(|| format!("dateTo is not YYYY-MM-DD: {}", args.date_to))?;
    Ok(DateRange { from, to })
}

// ============================================================================
// Summary construction
// ============================================================================

fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round_kpis(kpis: Option<&Value>) -> Map<String, Value> {
    let mut rounded: Map<String, Value> = kpis
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let value = match value.as_f64() {
                Some(n) if value.is_f64() && n.fract() != 0.0 => json!(round2(n)),
                _ => value,
            };
            (key, value)
        })
        .collect();

    let ticket = as_number(rounded.get("ticket_promedio")).unwrap_or(0.0);
    rounded.insert("ticket_promedio".to_owned(), json!(round2(ticket)));
    rounded
}

/// Top `BEST_DAYS` entries by `field`, descending; ties keep source order
fn best_days(days: Option<&Value>, field: &str) -> Vec<Value> {
    let mut days: Vec<Value> = days
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    days.sort_by(|a, b| {
        let a = as_number(a.get(field)).unwrap_or(0.0);
        let b = as_number(b.get(field)).unwrap_or(0.0);
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });
    days.truncate(BEST_DAYS);
    days
}

impl StatsSummary {
    /// Condense a `get_dashboard_stats` result
    #[must_use]
    pub fn from_stats(stats: &Value) -> Self {
        let top_products = stats
            .pointer("/top/productos")
            .and_then(Value::as_array)
            .map(|products| {
                products
                    .iter()
                    .take(TOP_PRODUCTS)
                    .map(|p| TopProduct {
                        nombre: p.get("nombre").cloned().unwrap_or(Value::Null),
                        unidades: p.get("unidades").cloned().unwrap_or(Value::Null),
                        venta_total: format!(
                            "{:.2}",
                            as_number(p.get("venta_total")).unwrap_or(0.0)
                        ),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            kpis: round_kpis(stats.get("kpis")),
            range: stats.get("range").cloned().unwrap_or(Value::Null),
            top_products,
            best_days: BestDays {
                sales: best_days(stats.pointer("/series/ventas_por_dia"), "ventas"),
                payments: best_days(stats.pointer("/series/pagos_por_dia"), "pagos"),
            },
        }
    }

    /// Plain-text rendering handed to the model in the narrative phase
    #[must_use]
    pub fn analysis_text(&self) -> String {
        let kpi = |keys: &[&str]| display_first(keys.iter().map(|k| self.kpis.get(*k)));
        let day_label = |day: &Value| {
            display_first(["fecha", "dia", "date"].iter().map(|k| day.get(*k)))
        };

        let mut lines = vec![
            format!(
                "Rango: {} → {}",
                display(self.range.get("from")),
                display(self.range.get("to"))
            ),
            String::new(),
            "KPIs:".to_owned(),
            format!("- Ventas: {}", kpi(&["ventas_total", "ventas", "total_ventas"])),
            format!("- Pagos: {}", kpi(&["pagos_total", "pagos", "total_pagos"])),
            format!("- Ticket promedio: {}", kpi(&["ticket_promedio"])),
            format!("- Facturas: {}", kpi(&["cantidad_facturas", "facturas"])),
            format!("- Clientes: {}", kpi(&["clientes", "cantidad_clientes"])),
            String::new(),
            "Top productos (máx 10):".to_owned(),
        ];
        lines.extend(self.top_products.iter().enumerate().map(|(i, p)| {
            format!(
                "- {}. {} | unidades: {} | venta: {}",
                i + 1,
                display(Some(&p.nombre)),
                display(Some(&p.unidades)),
                p.venta_total
            )
        }));
        lines.push(String::new());
        lines.push("Mejores días (ventas):".to_owned());
        lines.extend(
            self.best_days
                .sales
                .iter()
                .map(|d| format!("- {}: {}", day_label(d), display(d.get("ventas")))),
        );
        lines.push(String::new());
        lines.push("Mejores días (pagos):".to_owned());
        lines.extend(
            self.best_days
                .payments
                .iter()
                .map(|d| format!("- {}: {}", day_label(d), display(d.get("pagos")))),
        );
        lines.join("\n")
    }
}

// ============================================================================
// Text rendering
// ============================================================================

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// First present alternative, or `N/A`
fn display_first<'a>(mut candidates: impl Iterator<Item = Option<&'a Value>>) -> String {
    // Only null/missing falls through to the next key; an empty string stops the search
    let chosen = candidates
        .find(|v| !matches!(v, None | Some(Value::Null)))
        .flatten();
    display(chosen)
}

fn display(value: Option<&Value>) -> String {
    if is_blank(value) {
        return "N/A".to_owned();
    }
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => format_number(n),
        Some(other) => other.to_string(),
        None => "N/A".to_owned(),
    }
}

fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}
