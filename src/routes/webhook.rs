// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for Clerk user events.

use crate::error::AppError;
use crate::services::ProviderEvent;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhooks/clerk", post(handle_event))
}

#[derive(Serialize)]
struct WebhookResponse {
    message: &'static str,
}

/// Receive a Svix-signed Clerk event.
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let Err(e) = state.webhook_verifier.verify(
        header("svix-id"),
        header("svix-timestamp"),
        header("svix-signature"),
        &body,
    ) {
        tracing::warn!(
            svix_id = header("svix-id").unwrap_or("<missing>"),
            error = %e,
            "Security Alert: Rejected Clerk webhook"
        );
        return Err(AppError::Unauthorized);
    }

    let event = ProviderEvent::parse(&body)?;
    tracing::info!(event = event_name(&event), "Received Clerk webhook");

    let message = state.users.apply_provider_event(event).await?;
    Ok(Json(WebhookResponse { message }))
}

fn event_name(event: &ProviderEvent) -> &str {
    match event {
        ProviderEvent::UserCreated(_) => "user.created",
        ProviderEvent::UserUpdated(_) => "user.updated",
        ProviderEvent::UserDeleted { .. } => "user.deleted",
        ProviderEvent::Other(event_type) => event_type,
    }
}
