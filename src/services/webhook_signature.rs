// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Svix signature verification for Clerk webhooks.
//!
//! Signed content is `"{svix-id}.{svix-timestamp}.{body}"`, MACed with
//! HMAC-SHA256 under the base64 secret that follows `whsec_`. The
//! `svix-signature` header is a space-separated list of `v1,<base64>`
//! entries; any one matching is enough.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Allowed distance between `svix-timestamp` and now, either direction.
pub const TIMESTAMP_TOLERANCE_SECS: u64 = 5 * 60;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing svix headers")]
    MissingHeaders,
    #[error("invalid webhook secret")]
    InvalidSecret,
    #[error("invalid svix timestamp")]
    InvalidTimestamp,
    #[error("svix timestamp outside tolerance")]
    TimestampOutOfRange,
    #[error("no matching signature")]
    NoMatch,
}

/// Verifier holding the decoded signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    /// Decode a `whsec_`-prefixed secret. The prefix is optional.
    pub fn new(secret: &str) -> Result<Self, SignatureError> {
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;
        if key.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }
        Ok(Self { key })
    }

    /// Base64 `v1` signature for the given message.
    pub fn sign(&self, msg_id: &str, timestamp: i64, body: &[u8]) -> String {
        STANDARD.encode(self.mac(msg_id, &timestamp.to_string(), body))
    }

    /// Verify a delivery against the current time.
    pub fn verify(
        &self,
        msg_id: Option<&str>,
        timestamp: Option<&str>,
        signatures: Option<&str>,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        self.verify_at(
            msg_id,
            timestamp,
            signatures,
            body,
            chrono::Utc::now().timestamp(),
        )
    }

    pub fn verify_at(
        &self,
        msg_id: Option<&str>,
        timestamp: Option<&str>,
        signatures: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let (Some(msg_id), Some(timestamp), Some(signatures)) = (msg_id, timestamp, signatures)
        else {
            return Err(SignatureError::MissingHeaders);
        };

        let ts: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if now.abs_diff(ts) > TIMESTAMP_TOLERANCE_SECS {
            return Err(SignatureError::TimestampOutOfRange);
        }

        let expected = self.mac(msg_id, timestamp.trim(), body);

        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|sig| STANDARD.decode(sig).ok())
            .any(|sig| bool::from(sig.as_slice().ct_eq(expected.as_slice())));

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatch)
        }
    }

    fn mac(&self, msg_id: &str, timestamp: &str, body: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length.
        let mut mac = match HmacSha256::new_from_slice(&self.key) {
            Ok(mac) => mac,
            Err(_) => return Vec::new(),
        };
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_dGVzdF93ZWJob29rX3NlY3JldF8zMl9ieXRlcyEhISE=";
    const NOW: i64 = 1_700_000_000;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SECRET).unwrap()
    }

    #[test]
    fn accepts_valid_signature_among_several() {
        let v = verifier();
        let body = br#"{"type":"user.created"}"#;
        let sig = v.sign("msg_1", NOW, body);
        let header = format!("v1,bm9wZQ== v1,{}", sig);

        assert_eq!(
            v.verify_at(
                Some("msg_1"),
                Some(&NOW.to_string()),
                Some(&header),
                body,
                NOW + 10
            ),
            Ok(())
        );
    }

    #[test]
    fn rejects_tampered_body() {
        let v = verifier();
        let sig = format!("v1,{}", v.sign("msg_1", NOW, b"original"));
        assert_eq!(
            v.verify_at(
                Some("msg_1"),
                Some(&NOW.to_string()),
                Some(&sig),
                b"tampered",
                NOW
            ),
            Err(SignatureError::NoMatch)
        );
    }

    #[test]
    fn rejects_stale_and_future_timestamps() {
        let v = verifier();
        let sig = format!("v1,{}", v.sign("msg_1", NOW, b"x"));
        let ts = NOW.to_string();

        assert_eq!(
            v.verify_at(Some("msg_1"), Some(&ts), Some(&sig), b"x", NOW + 301),
            Err(SignatureError::TimestampOutOfRange)
        );
        assert_eq!(
            v.verify_at(Some("msg_1"), Some(&ts), Some(&sig), b"x", NOW - 301),
            Err(SignatureError::TimestampOutOfRange)
        );

        for extreme in [i64::MIN, i64::MAX, -NOW] {
            let ts = extreme.to_string();
            assert_eq!(
                v.verify_at(Some("msg_1"), Some(&ts), Some(&sig), b"x", NOW),
                Err(SignatureError::TimestampOutOfRange)
            );
        }
    }

    #[test]
    fn rejects_missing_headers() {
        assert_eq!(
            verifier().verify_at(None, Some("1"), Some("v1,x"), b"", NOW),
            Err(SignatureError::MissingHeaders)
        );
    }

    #[test]
    fn rejects_bad_secret() {
        assert!(WebhookVerifier::new("whsec_***").is_err());
    }
}
