// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Street-segment visit records.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A recorded visit of one street segment during a tracking session.
///
/// Append-only. The document ID is derived from
/// (user_id, session_id, street_id, entry_timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitedStreet {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub street_id: String,
    pub street_name: String,
    /// Entry time, Unix milliseconds
    pub entry_timestamp: i64,
    /// Exit time, Unix milliseconds
    pub exit_timestamp: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub entry_latitude: f64,
    pub entry_longitude: f64,
}

/// One visit entry as sent by the client.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VisitedStreetInput {
    #[validate(length(min = 1, message = "is required"))]
    pub street_id: String,
    #[serde(default)]
    pub street_name: String,
    pub entry_timestamp: i64,
    pub exit_timestamp: Option<i64>,
    pub duration_seconds: Option<i64>,
    #[validate(range(min = -90.0, max = 90.0, message = "must be within [-90, 90]"))]
    pub entry_latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be within [-180, 180]"))]
    pub entry_longitude: f64,
}

impl VisitedStreet {
    pub fn from_input(user_id: &str, session_id: &str, input: &VisitedStreetInput) -> Self {
        Self {
            id: visit_id(user_id, session_id, &input.street_id, input.entry_timestamp),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            street_id: input.street_id.clone(),
            street_name: input.street_name.clone(),
            entry_timestamp: input.entry_timestamp,
            exit_timestamp: input.exit_timestamp,
            duration_seconds: input.duration_seconds,
            entry_latitude: input.entry_latitude,
            entry_longitude: input.entry_longitude,
        }
    }
}

/// Document ID for a visit, unique per (user, session, street, entry time).
pub fn visit_id(user_id: &str, session_id: &str, street_id: &str, entry_timestamp: i64) -> String {
    crate::db::composite_id(&[
        user_id,
        session_id,
        street_id,
        &entry_timestamp.to_string(),
    ])
}
