// ABOUTME: HTTP middleware for request tracing, session checks, and CORS
// ABOUTME: Provides request ID spans, the session guard for API routes, and the CORS layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

pub mod auth;
pub mod cors;
pub mod tracing;

// Session guard
pub use auth::require_session;

// CORS configuration
pub use cors::setup_cors;

// Request tracing
pub use tracing::{create_request_span, request_id};
