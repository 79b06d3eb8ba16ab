// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clerk Backend API client.
//!
//! Clerk is the identity provider of record for email, names and avatar.
//! Only the user lookup is needed here; session tokens are verified
//! locally (see [`crate::services::session`]).

use crate::error::AppError;
use crate::models::ProviderProfile;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Clerk Backend API client.
#[derive(Clone)]
pub struct ClerkClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl ClerkClient {
    /// Create a new client. `base_url` has no trailing slash.
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Fetch the canonical profile for a user.
    pub async fn get_user(&self, user_id: &str) -> Result<ProviderProfile, AppError> {
        let url = format!(
            "{}/users/{}",
            self.base_url,
            urlencoding::encode(user_id)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Clerk request failed: {}", e)))?;

        let user: ClerkUser = self.check_response_json(response).await?;
        tracing::debug!(user_id, "Fetched user from Clerk");
        Ok(user.into_profile())
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                tracing::error!("Clerk rejected the secret key (401)");
            }
            tracing::warn!(status = %status, body = %body, "Clerk request failed");

            return Err(AppError::IdentityProvider(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Invalid Clerk response: {}", e)))
    }
}

// ─── Clerk API Types ─────────────────────────────────────────

/// Clerk user object, as returned by `GET /users/{id}` and carried in
/// `user.*` webhook events.
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    pub primary_email_address_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClerkEmailAddress {
    pub id: String,
    pub email_address: String,
}

impl ClerkUser {
    /// The primary address, else the first one, else empty.
    pub fn primary_email(&self) -> String {
        let primary = self.primary_email_address_id.as_deref().and_then(|id| {
            self.email_addresses
                .iter()
                .find(|address| address.id == id)
        });

        primary
            .or_else(|| self.email_addresses.first())
            .map(|address| address.email_address.clone())
            .unwrap_or_default()
    }

    pub fn into_profile(self) -> ProviderProfile {
        ProviderProfile {
            email: self.primary_email(),
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            image_url: self.image_url.filter(|url| !url.is_empty()),
        }
    }
}

// ─── Webhook Events ──────────────────────────────────────────

/// A decoded `user.*` webhook event.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    UserCreated(ClerkUser),
    UserUpdated(ClerkUser),
    UserDeleted { id: String },
    /// Any event type we do not act on
    Other(String),
}

#[derive(Deserialize)]
struct WebhookEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct DeletedObject {
    id: Option<String>,
}

impl ProviderEvent {
    /// Decode a webhook body. The signature must already be verified.
    pub fn parse(body: &[u8]) -> Result<Self, AppError> {
        let envelope: WebhookEnvelope = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON payload: {}", e)))?;

        let user_data = |data: serde_json::Value| {
            serde_json::from_value::<ClerkUser>(data)
                .map_err(|e| AppError::BadRequest(format!("Invalid user data: {}", e)))
        };

        match envelope.event_type.as_str() {
            "user.created" => Ok(Self::UserCreated(user_data(envelope.data)?)),
            "user.updated" => Ok(Self::UserUpdated(user_data(envelope.data)?)),
            "user.deleted" => {
                let deleted: DeletedObject = serde_json::from_value(envelope.data)
                    .map_err(|e| AppError::BadRequest(format!("Invalid user data: {}", e)))?;
                let id = deleted
                    .id
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| AppError::BadRequest("Missing user id".to_string()))?;
                Ok(Self::UserDeleted { id })
            }
            _ => Ok(Self::Other(envelope.event_type)),
        }
    }
}
