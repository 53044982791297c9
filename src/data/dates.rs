// ABOUTME: Date range parsing and default windows for dashboard queries
// ABOUTME: Accepts strict YYYY-MM-DD values and falls back to trailing windows ending today
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use chrono::{Duration, Local, NaiveDate};
use commerce_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Wire format for dates exchanged with the data service
const ISO_DATE: &str = "%Y-%m-%d";

/// Inclusive date range sent as `p_from` / `p_to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day
    pub from: NaiveDate,
    /// Last day
    pub to: NaiveDate,
}

impl DateRange {
    /// Range of `days_back + 1` days ending at `today`
    #[must_use]
    pub fn trailing(today: NaiveDate, days_back: i64) -> Self {
        Self {
            from: today - Duration::days(days_back),
            to: today,
        }
    }

    /// Trailing range ending on the server's local date
    #[must_use]
    pub fn trailing_from_today(days_back: i64) -> Self {
        Self::trailing(Local::now().date_naive(), days_back)
    }

    /// Take each bound from the query when it is a valid `YYYY-MM-DD`, otherwise from `fallback`
    #[must_use]
    pub fn from_query(from: Option<&str>, to: Option<&str>, fallback: Self) -> Self {
        Self {
            from: from.and_then(parse_iso_date).unwrap_or(fallback.from),
            to: to.and_then(parse_iso_date).unwrap_or(fallback.to),
        }
    }

    /// `from` as `YYYY-MM-DD`
    #[must_use]
    pub fn from_iso(&self) -> String {
        self.from.format(ISO_DATE).to_string()
    }

    /// `to` as `YYYY-MM-DD`
    #[must_use]
    pub fn to_iso(&self) -> String {
        self.to.format(ISO_DATE).to_string()
    }
}

/// Parse a strict `YYYY-MM-DD` date
#[must_use]
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let shape_ok = raw.len() == 10
        && raw.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(raw, ISO_DATE).ok()
}

/// Require a strict `YYYY-MM-DD` date
///
/// # Errors
///
/// Returns an invalid-input error naming the parameter when the value is missing or malformed
pub fn require_iso_date(name: &str, raw: Option<&str>) -> AppResult<NaiveDate> {
    let raw = raw
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::missing_field(name))?;
    parse_iso_date(raw)
        .ok_or_else(|| AppError::invalid_input(format!("{name} must be a YYYY-MM-DD date")))
}
