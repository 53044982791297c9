// ABOUTME: Session validation for dashboard users signed in through the hosted identity service
// ABOUTME: Verifies HS256 access tokens from the Authorization header or the session cookie
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! # Session Authentication
//!
//! Users sign in against the hosted identity service; this server only checks
//! that the access token it hands out is genuine, unexpired, and issued for
//! signed-in users. Data-service calls keep using the server's own key.

use commerce_core::errors::{AppError, AppResult};
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Audience claim carried by tokens of signed-in users
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Cookie holding the access token for browser sessions
pub const SESSION_COOKIE: &str = "sb-access-token";

/// Claims read from an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Audience
    pub aud: String,
    /// User email, when present
    #[serde(default)]
    pub email: Option<String>,
    /// Role granted by the identity service
    #[serde(default)]
    pub role: Option<String>,
}

/// Authenticated user attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User ID from the `sub` claim
    pub id: String,
    /// Email, when the token carries one
    pub email: Option<String>,
}

/// Validates session tokens
#[derive(Clone)]
pub struct SupabaseAuth {
    key: DecodingKey,
    validation: Validation,
}

impl SupabaseAuth {
    /// Create a validator for tokens signed with `jwt_secret`
    #[must_use]
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Validate a raw token
    ///
    /// # Errors
    ///
    /// Returns an auth error if the token is expired, malformed, or badly signed
    pub fn validate(&self, token: &str) -> AppResult<AuthUser> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::auth_expired(),
                _ => AppError::auth_invalid(format!("Invalid session token: {e}")),
            }
        })?;

        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }

    /// Find and validate the session token carried by a request
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when no token is present, or the validation error
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        let token = bearer_token(headers)
            .or_else(|| cookie_value(headers, SESSION_COOKIE))
            .ok_or_else(AppError::auth_required)?;
        self.validate(&token)
    }
}

/// Token from an `Authorization: Bearer` header
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

/// Value of the named cookie across all `Cookie` headers
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}
