// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clerk session token verification.
//!
//! Production tokens are RS256 JWTs signed by a key from the Clerk JWKS.
//! Keys are cached with a TTL taken from `Cache-Control` and refreshed
//! when a token names an unknown `kid`. When `SESSION_SIGNING_KEY` is set
//! tokens are instead verified as HS256 with that key (local dev, tests).

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Session verification error categories.
#[derive(Debug, Clone)]
pub enum SessionError {
    /// The token is malformed, expired, or not signed by a trusted key.
    Invalid(String),
    /// The key set could not be fetched.
    Transient(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Invalid(msg) => write!(f, "invalid session: {msg}"),
            SessionError::Transient(msg) => write!(f, "session verification unavailable: {msg}"),
        }
    }
}

#[derive(Clone)]
enum VerifierMode {
    Jwks { url: String },
    SharedSecret { decoding_key: Arc<DecodingKey> },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Claims we rely on from a Clerk session token.
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

/// Verifier for Clerk session tokens.
pub struct SessionVerifier {
    http_client: reqwest::Client,
    mode: VerifierMode,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl SessionVerifier {
    /// Build a verifier for the configured mode.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building session verifier HTTP client")?;

        let mode = match &config.session_signing_key {
            Some(key) => {
                tracing::warn!("Verifying session tokens with a shared HS256 key");
                VerifierMode::SharedSecret {
                    decoding_key: Arc::new(DecodingKey::from_secret(key)),
                }
            }
            None => {
                tracing::info!(jwks_url = %config.clerk_jwks_url, "Verifying session tokens against Clerk JWKS");
                VerifierMode::Jwks {
                    url: config.clerk_jwks_url.clone(),
                }
            }
        };

        Ok(Self {
            http_client,
            mode,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify a session token and return the user ID (`sub`).
    pub async fn verify(&self, token: &str) -> Result<String, SessionError> {
        let header = decode_header(token)
            .map_err(|e| SessionError::Invalid(format!("invalid JWT header: {e}")))?;

        let (algorithm, decoding_key) = match &self.mode {
            VerifierMode::SharedSecret { decoding_key } => (Algorithm::HS256, decoding_key.clone()),
            VerifierMode::Jwks { .. } => {
                let kid = header
                    .kid
                    .as_deref()
                    .ok_or_else(|| SessionError::Invalid("missing JWT kid".to_string()))?;
                (Algorithm::RS256, self.decoding_key_for_kid(kid).await?)
            }
        };

        if header.alg != algorithm {
            return Err(SessionError::Invalid(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Clerk session tokens carry `azp`, not `aud`.
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = CLOCK_SKEW_SECS;

        let token_data = decode::<SessionClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| SessionError::Invalid(format!("JWT validation failed: {e}")))?;

        let user_id = token_data.claims.sub;
        if user_id.trim().is_empty() {
            return Err(SessionError::Invalid("empty sub claim".to_string()));
        }

        Ok(user_id)
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, SessionError> {
        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(SessionError::Invalid(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), SessionError> {
        let VerifierMode::Jwks { url } = &self.mode else {
            return Ok(());
        };

        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_url = %url, "Refreshing Clerk JWKS cache");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| SessionError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SessionError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| SessionError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(SessionError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Clerk JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

/// RS256 signing keys from a JWKS, by `kid`.
fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            continue;
        }
        if jwk.use_.as_deref().is_some_and(|use_| use_ != "sig") {
            continue;
        }

        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
            }
        }
    }

    keys_by_kid
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")
            .and_then(|raw| raw.trim_matches('"').parse::<u64>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn hs256_verifier() -> SessionVerifier {
        SessionVerifier::new(&Config::test_default()).unwrap()
    }

    fn token(sub: &str, exp_offset: i64, key: &[u8]) -> String {
        let exp = chrono::Utc::now().timestamp() + exp_offset;
        encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": sub, "exp": exp }),
            &EncodingKey::from_secret(key),
        )
        .unwrap()
    }

    #[test]
    fn parse_cache_control_max_age_valid() {
        assert_eq!(
            parse_cache_control_max_age("public, max-age=3600"),
            Some(3600)
        );
        assert_eq!(parse_cache_control_max_age("max-age=\"120\""), Some(120));
        assert_eq!(parse_cache_control_max_age("public, immutable"), None);
        assert_eq!(parse_cache_control_max_age("max-age=abc"), None);
    }

    #[tokio::test]
    async fn shared_secret_accepts_valid_token() {
        let verifier = hs256_verifier();
        let key = Config::test_default().session_signing_key.unwrap();
        let user_id = verifier.verify(&token("user_1", 3600, &key)).await.unwrap();
        assert_eq!(user_id, "user_1");
    }

    #[tokio::test]
    async fn shared_secret_rejects_expired_and_forged_tokens() {
        let verifier = hs256_verifier();
        let key = Config::test_default().session_signing_key.unwrap();

        assert!(matches!(
            verifier.verify(&token("user_1", -3600, &key)).await,
            Err(SessionError::Invalid(_))
        ));
        assert!(matches!(
            verifier
                .verify(&token("user_1", 3600, b"some_other_key_of_sufficient_len"))
                .await,
            Err(SessionError::Invalid(_))
        ));
        assert!(matches!(
            verifier.verify("not.a.jwt").await,
            Err(SessionError::Invalid(_))
        ));
    }
}
