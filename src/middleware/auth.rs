// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::error::AppError;
use crate::services::SessionError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie Clerk's frontend SDK stores the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated user extracted from the session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Clerk user ID (`sub` claim)
    pub user_id: String,
}

/// Middleware that requires a valid Clerk session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or(AppError::Unauthorized)?,
    };

    let user_id = state
        .session_verifier
        .verify(&token)
        .await
        .map_err(|e| match e {
            SessionError::Invalid(reason) => {
                tracing::debug!(reason = %reason, "Rejected session token");
                AppError::InvalidToken
            }
            SessionError::Transient(reason) => AppError::IdentityProvider(reason),
        })?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
