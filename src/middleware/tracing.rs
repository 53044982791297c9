// ABOUTME: Request tracing helpers for correlation and structured logging
// ABOUTME: Generates request IDs and creates the per-request span used by the HTTP trace layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use axum::extract::Request;
use uuid::Uuid;

/// Header echoing a caller-supplied request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID from the incoming header, or a fresh one
#[must_use]
pub fn request_id(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(|| format!("req_{}", Uuid::new_v4().simple()), str::to_owned)
}

/// Create the tracing span for an HTTP request
#[must_use]
pub fn create_request_span(request: &Request) -> tracing::Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request),
        user_id = tracing::field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn keeps_incoming_request_id() {
        let request = Request::builder()
            .uri("/api/chat")
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&request), "abc-123");
    }

    #[test]
    fn generates_request_id() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(request_id(&request).starts_with("req_"));
    }
}
