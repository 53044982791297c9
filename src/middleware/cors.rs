// ABOUTME: CORS middleware configuration for the dashboard API
// ABOUTME: Builds the allowed-origin policy from the configured comma-separated origin list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Configure CORS for the dashboard frontend
///
/// An empty list or `*` allows any origin. Otherwise only the listed origins
/// are allowed, and credentials (the session cookie) are permitted.
///
/// ```bash
/// export CORS_ALLOWED_ORIGINS="https://panel.example.com,https://staging.example.com"
/// ```
#[must_use]
pub fn setup_cors(config: &CorsConfig) -> CorsLayer {
    let origins = parse_origins(&config.allowed_origins);

    let layer = CorsLayer::new()
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    // Credentials cannot be combined with a wildcard origin
    match origins {
        Some(list) => layer
            .allow_origin(AllowOrigin::list(list))
            .allow_credentials(true),
        None => layer.allow_origin(AllowOrigin::any()),
    }
}

/// Explicit origins, or `None` for any
fn parse_origins(raw: &str) -> Option<Vec<HeaderValue>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "*" {
        return None;
    }

    let origins: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    if origins.is_empty() {
        None
    } else {
        Some(origins)
    }
}
