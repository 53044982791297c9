// ABOUTME: Axum IntoResponse implementation for AppError
// ABOUTME: Renders errors as flat JSON bodies with the mapped HTTP status code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;
use tracing::{error, warn};

use super::{AppError, ErrorCode};

/// Wire format of an error response
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: ErrorCode,
    /// Always present; `null` when the collaborator gave none
    details: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = ?self.code, details = ?self.details, "{}", self.message);
        } else {
            warn!(code = ?self.code, "{}", self.message);
        }

        // Session failures never leak the validation reason
        let message = if self.code.is_auth() {
            "Unauthorized"
        } else {
            self.message.as_str()
        };

        let body = ErrorBody {
            error: message,
            code: self.code,
            details: self.details.as_deref(),
        };

        (status, Json(body)).into_response()
    }
}
