// ABOUTME: Session middleware guarding the dashboard API routes
// ABOUTME: Rejects requests without a valid session and attaches the user to request extensions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use commerce_core::errors::AppResult;
use tracing::{debug, Span};

use crate::resources::ServerResources;

/// Require a valid session before running the inner handler
///
/// The authenticated user is stored in the request extensions as
/// [`crate::auth::AuthUser`].
///
/// # Errors
///
/// Returns an auth error (401) when the session is missing or invalid
pub async fn require_session(
    State(resources): State<Arc<ServerResources>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user = resources.auth.authenticate(request.headers())?;
    Span::current().record("user_id", user.id.as_str());
    debug!(user_id = %user.id, "Session accepted");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
