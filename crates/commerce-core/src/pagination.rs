// ABOUTME: Offset pagination and numeric clamps applied to query parameters
// ABOUTME: Normalizes page/limit pairs and bounded thresholds before they reach the data service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Normalized page request
///
/// `page` is at least 1 and `limit` always lies in `[1, max_limit]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl PageRequest {
    /// Clamp raw values into a valid page request
    #[must_use]
    pub fn clamped(page: i64, limit: i64, max_limit: u32) -> Self {
        let page = page.clamp(1, i64::from(u32::MAX));
        let limit = limit.clamp(1, i64::from(max_limit.max(1)));
        Self {
            page: page as u32,
            limit: limit as u32,
        }
    }

    /// Parse raw query values, falling back to defaults for missing or unparsable input
    #[must_use]
    pub fn parse(page: Option<&str>, limit: Option<&str>, default_limit: u32, max_limit: u32) -> Self {
        let page = parse_integer(page).unwrap_or(1);
        let limit = parse_integer(limit).unwrap_or_else(|| i64::from(default_limit));
        Self::clamped(page, limit, max_limit)
    }

    /// Product listing pagination (default 20, capped at 50)
    #[must_use]
    pub fn for_products(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::parse(
            page,
            limit,
            defaults::PRODUCT_PAGE_SIZE,
            defaults::PRODUCT_PAGE_SIZE_MAX,
        )
    }

    /// Row offset of the first item on this page
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

fn parse_integer(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
}

/// Parse a number and clamp it into `[min, max]`, falling back when absent or not finite
#[must_use]
pub fn clamp_number(raw: Option<&str>, fallback: f64, min: f64, max: f64) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map_or(fallback, |v| v.clamp(min, max))
}
