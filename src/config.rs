// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment
//! (Cloud Run secret bindings), so everything is read once at startup.

use std::env;

/// Which datastore backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatastoreKind {
    /// Cloud Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set)
    Firestore,
    /// In-process store; nothing survives a restart
    Memory,
}

impl DatastoreKind {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("DATASTORE", raw.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Datastore backend
    pub datastore: DatastoreKind,
    /// Clerk Backend API base URL (no trailing slash)
    pub clerk_api_url: String,
    /// JWKS endpoint used to verify session tokens
    pub clerk_jwks_url: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Base URL that invite links point at
    pub invite_base_url: String,

    // --- Secrets ---
    /// Clerk secret key (Backend API bearer token)
    pub clerk_secret_key: String,
    /// Svix signing secret for Clerk webhooks (`whsec_...`)
    pub clerk_webhook_secret: String,
    /// HS256 key for session tokens. When set, JWKS verification is skipped.
    pub session_signing_key: Option<Vec<u8>>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let clerk_api_url = env::var("CLERK_API_URL")
            .unwrap_or_else(|_| "https://api.clerk.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        let clerk_jwks_url =
            env::var("CLERK_JWKS_URL").unwrap_or_else(|_| format!("{}/jwks", clerk_api_url));

        let datastore = match env::var("DATASTORE") {
            Ok(raw) => DatastoreKind::parse(&raw)?,
            Err(_) => DatastoreKind::Firestore,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            datastore,
            clerk_api_url,
            clerk_jwks_url,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            invite_base_url: env::var("INVITE_BASE_URL")
                .unwrap_or_else(|_| "https://citystat.app/invite".to_string()),

            clerk_secret_key: env::var("CLERK_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CLERK_SECRET_KEY"))?,
            clerk_webhook_secret: env::var("CLERK_WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CLERK_WEBHOOK_SECRET"))?,
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .ok()
                .filter(|v| !v.is_empty())
                .map(String::into_bytes),
        })
    }

    /// Config for tests: in-memory datastore and an HS256 session key.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            datastore: DatastoreKind::Memory,
            clerk_api_url: "http://127.0.0.1:9".to_string(),
            clerk_jwks_url: "http://127.0.0.1:9/jwks".to_string(),
            frontend_url: "http://localhost:8081".to_string(),
            invite_base_url: "https://citystat.app/invite".to_string(),
            clerk_secret_key: "sk_test_secret".to_string(),
            // base64("test_webhook_secret_32_bytes!!!!")
            clerk_webhook_secret: "whsec_dGVzdF93ZWJob29rX3NlY3JldF8zMl9ieXRlcyEhISE=".to_string(),
            session_signing_key: Some(b"test_session_key_32_bytes_minimum!".to_vec()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
