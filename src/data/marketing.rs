// ABOUTME: Meta Ads data access for summaries, rankings with recommendations, and daily series
// ABOUTME: Clamps ranking thresholds and maps loosely typed procedure rows into typed records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use commerce_core::constants::{defaults, rpc as procedures};
use commerce_core::errors::{AppError, AppResult};
use commerce_core::pagination::clamp_number;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::{Comparison, DateRange};
use crate::rpc::{RpcArgs, RpcClient};

/// Dashboard level shown by the marketing view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaLevel {
    /// Account-wide summary and series
    #[default]
    Resumen,
    /// Campaign ranking
    Campaign,
    /// Ad-set ranking
    Adset,
}

impl MetaLevel {
    /// Parse a query value; unknown levels show the summary
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("campaign") => Self::Campaign,
            Some("adset") => Self::Adset,
            _ => Self::Resumen,
        }
    }
}

/// Ranking thresholds used by the recommendation procedures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaThresholds {
    /// Target customer acquisition cost
    pub cac_objetivo: f64,
    /// Minimum acceptable click-through rate, in percent
    pub ctr_min: f64,
    /// Maximum frequency before saturation
    pub freq_max: f64,
    /// Conversations needed before a row is judged
    pub min_conversations: u32,
    /// Row cap
    pub limit: u32,
}

impl Default for MetaThresholds {
    fn default() -> Self {
        Self {
            cac_objetivo: 300.0,
            ctr_min: 1.5,
            freq_max: 3.0,
            min_conversations: 5,
            limit: 50,
        }
    }
}

impl MetaThresholds {
    /// Build from raw query values, clamping each into its allowed range
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_query(
        cac: Option<&str>,
        ctr: Option<&str>,
        freq: Option<&str>,
        minc: Option<&str>,
        limit: Option<&str>,
    ) -> Self {
        let base = Self::default();
        Self {
            cac_objetivo: clamp_number(cac, base.cac_objetivo, 0.0, f64::MAX),
            ctr_min: clamp_number(ctr, base.ctr_min, 0.0, 100.0),
            freq_max: clamp_number(freq, base.freq_max, 0.0, f64::MAX),
            // Clamped to non-negative integral ranges above
            min_conversations: clamp_number(
                minc,
                f64::from(base.min_conversations),
                0.0,
                f64::from(u32::MAX),
            )
            .trunc() as u32,
            limit: clamp_number(limit, f64::from(base.limit), 1.0, 500.0).trunc() as u32,
        }
    }
}

/// Action suggested for a campaign or ad set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccionRecomendada {
    /// Increase budget
    Escalar,
    /// Keep as is
    #[default]
    Mantener,
    /// Creative underperforms
    RevisarArte,
    /// Audience saturated
    Saturacion,
    /// Stop spending
    Pausar,
}

impl AccionRecomendada {
    /// Parse a procedure value; unknown actions mean keep as is
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("ESCALAR") => Self::Escalar,
            Some("REVISAR_ARTE") => Self::RevisarArte,
            Some("SATURACION") => Self::Saturacion,
            Some("PAUSAR") => Self::Pausar,
            _ => Self::Mantener,
        }
    }
}

/// Ranked campaign or ad set with its recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoRow {
    pub id: String,
    pub name: String,
    pub spend: f64,
    pub conversations_started: f64,
    pub cac: Option<f64>,
    pub impressions: f64,
    pub reach: f64,
    pub clicks: f64,
    pub ctr: Option<f64>,
    pub cpc: Option<f64>,
    pub cpm: Option<f64>,
    pub frequency: Option<f64>,
    pub accion_recomendada: AccionRecomendada,
    pub motivo: Option<String>,
}

impl RecoRow {
    /// Map a ranking row whose identity lives under `id_key` / `name_key`
    #[must_use]
    pub fn from_row(row: &Value, id_key: &str, name_key: &str) -> Self {
        Self {
            id: text(row.get(id_key)),
            name: text(row.get(name_key)),
            spend: number_or_zero(row.get("spend")),
            conversations_started: number_or_zero(row.get("conversations_started")),
            cac: nullable_number(row.get("cac")),
            impressions: number_or_zero(row.get("impressions")),
            reach: number_or_zero(row.get("reach")),
            clicks: number_or_zero(row.get("clicks")),
            ctr: nullable_number(row.get("ctr")),
            cpc: nullable_number(row.get("cpc")),
            cpm: nullable_number(row.get("cpm")),
            frequency: nullable_number(row.get("frequency")),
            accion_recomendada: AccionRecomendada::parse(
                row.get("accion_recomendada").and_then(Value::as_str),
            ),
            motivo: row
                .get("motivo")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }
}

/// One day of a current-vs-comparison series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub day: String,
    pub actual: Option<f64>,
    pub compare: Option<f64>,
}

/// Spend and CAC series extracted from the daily timeseries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSeries {
    pub series_spend: Vec<SeriesPoint>,
    pub series_cac: Vec<SeriesPoint>,
}

impl MetaSeries {
    /// Split timeseries rows into spend and CAC series
    #[must_use]
    pub fn from_rows(rows: &[Value]) -> Self {
        let mut series = Self::default();
        for row in rows {
            let day = text(row.get("day"));
            series.series_spend.push(SeriesPoint {
                day: day.clone(),
                actual: Some(number_or_zero(row.get("spend_actual"))),
                compare: Some(number_or_zero(row.get("spend_compare"))),
            });
            series.series_cac.push(SeriesPoint {
                day,
                actual: nullable_number(row.get("cac_actual")),
                compare: nullable_number(row.get("cac_compare")),
            });
        }
        series
    }
}

fn nullable_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_or_zero(value: Option<&Value>) -> f64 {
    nullable_number(value).unwrap_or(0.0)
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Prefix the procedure name onto an upstream error
fn prefixed(procedure: &str, err: AppError) -> AppError {
    AppError {
        message: format!("{procedure}: {}", err.message),
        ..err
    }
}

fn row_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        _ => Vec::new(),
    }
}

async fn call(rpc: &dyn RpcClient, procedure: &str, args: &RpcArgs) -> AppResult<Value> {
    rpc.call(procedure, args)
        .await
        .map_err(|e| prefixed(procedure, e))
}

/// Account summary for the range, or `None` when the procedure returned no row
///
/// # Errors
///
/// Returns an upstream error prefixed with the procedure name
#[instrument(skip(rpc))]
pub async fn meta_summary(rpc: &dyn RpcClient, range: &DateRange) -> AppResult<Option<Value>> {
    let args = RpcArgs::new()
        .arg("p_from", range.from_iso())
        .arg("p_to", range.to_iso())
        .arg("p_conv_level", defaults::META_CONVERSION_LEVEL);
    let rows = row_list(call(rpc, procedures::META_SUMMARY, &args).await?);
    Ok(rows.into_iter().next())
}

fn ranking_args(range: &DateRange, thresholds: &MetaThresholds) -> RpcArgs {
    RpcArgs::new()
        .arg("p_from", range.from_iso())
        .arg("p_to", range.to_iso())
        .arg("p_limit", thresholds.limit)
        .arg("p_min_conversations", thresholds.min_conversations)
        .arg("p_cac_objetivo", thresholds.cac_objetivo)
        .arg("p_ctr_min", thresholds.ctr_min)
        .arg("p_freq_max", thresholds.freq_max)
}

/// Campaigns ranked with recommendations
///
/// # Errors
///
/// Returns an upstream error prefixed with the procedure name
#[instrument(skip(rpc))]
pub async fn meta_campaign_ranking(
    rpc: &dyn RpcClient,
    range: &DateRange,
    thresholds: &MetaThresholds,
) -> AppResult<Vec<RecoRow>> {
    let rows = row_list(
        call(
            rpc,
            procedures::META_CAMPAIGN_RANKING,
            &ranking_args(range, thresholds),
        )
        .await?,
    );
    Ok(rows
        .iter()
        .map(|row| RecoRow::from_row(row, "campaign_id", "campaign_name"))
        .collect())
}

/// Ad sets ranked with recommendations
///
/// # Errors
///
/// Returns an upstream error prefixed with the procedure name
#[instrument(skip(rpc))]
pub async fn meta_adset_ranking(
    rpc: &dyn RpcClient,
    range: &DateRange,
    thresholds: &MetaThresholds,
) -> AppResult<Vec<RecoRow>> {
    let rows = row_list(
        call(
            rpc,
            procedures::META_ADSET_RANKING,
            &ranking_args(range, thresholds),
        )
        .await?,
    );
    Ok(rows
        .iter()
        .map(|row| RecoRow::from_row(row, "adset_id", "adset_name"))
        .collect())
}

/// Daily spend, conversations, and CAC against the comparison period
///
/// # Errors
///
/// Returns an upstream error prefixed with the procedure name
#[instrument(skip(rpc))]
pub async fn meta_timeseries(
    rpc: &dyn RpcClient,
    range: &DateRange,
    comparison: Comparison,
) -> AppResult<Vec<Value>> {
    let args = RpcArgs::new()
        .arg("p_from", range.from_iso())
        .arg("p_to", range.to_iso())
        .arg("p_compare", comparison.as_str())
        .arg("p_conv_level", defaults::META_CONVERSION_LEVEL);
    Ok(row_list(
        call(rpc, procedures::META_TIMESERIES, &args).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn thresholds_clamp_into_range() {
        let t = MetaThresholds::from_query(Some("-5"), Some("250"), None, Some("abc"), Some("0"));
        assert!(t.cac_objetivo.abs() < f64::EPSILON);
        assert!((t.ctr_min - 100.0).abs() < f64::EPSILON);
        assert!((t.freq_max - 3.0).abs() < f64::EPSILON);
        assert_eq!(t.min_conversations, 5);
        assert_eq!(t.limit, 1);

        let t = MetaThresholds::from_query(None, None, None, None, Some("9000"));
        assert_eq!(t.limit, 500);
    }

    #[test]
    fn thresholds_echo_in_camel_case() {
        let value = serde_json::to_value(MetaThresholds::default()).unwrap();
        assert_eq!(value["cacObjetivo"], json!(300.0));
        assert_eq!(value["minConversations"], json!(5));
    }

    #[test]
    fn reco_row_mapping() {
        let row = json!({
            "adset_id": 120_211,
            "adset_name": "Remarketing",
            "spend": "1520.5",
            "conversations_started": 4,
            "cac": null,
            "ctr": 0.8,
            "frequency": 3.4,
            "accion_recomendada": "SATURACION",
            "motivo": "Frecuencia alta"
        });
        let mapped = RecoRow::from_row(&row, "adset_id", "adset_name");
        assert_eq!(mapped.id, "120211");
        assert!((mapped.spend - 1520.5).abs() < f64::EPSILON);
        assert!((mapped.conversations_started - 4.0).abs() < f64::EPSILON);
        assert!(mapped.cac.is_none());
        assert!(mapped.impressions.abs() < f64::EPSILON);
        assert_eq!(mapped.accion_recomendada, AccionRecomendada::Saturacion);
        assert_eq!(mapped.motivo.as_deref(), Some("Frecuencia alta"));
    }

    #[test]
    fn unknown_action_maps_to_keep() {
        assert_eq!(AccionRecomendada::parse(Some("DUPLICAR")), AccionRecomendada::Mantener);
        assert_eq!(
            serde_json::to_value(AccionRecomendada::RevisarArte).unwrap(),
            json!("REVISAR_ARTE")
        );
    }

    #[test]
    fn series_split() {
        let rows = vec![json!({
            "day": "2025-01-02",
            "spend_actual": 100,
            "spend_compare": 80,
            "cac_actual": 25.0,
            "cac_compare": null
        })];
        let series = MetaSeries::from_rows(&rows);
        assert_eq!(series.series_spend[0].actual, Some(100.0));
        assert_eq!(series.series_cac[0].compare, None);
        assert_eq!(series.series_cac[0].day, "2025-01-02");
    }

    #[test]
    fn level_parsing() {
        assert_eq!(MetaLevel::parse(Some("adset")), MetaLevel::Adset);
        assert_eq!(MetaLevel::parse(Some("ads")), MetaLevel::Resumen);
    }
}
