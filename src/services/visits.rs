// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Street-visit recording.

use crate::db::Datastore;
use crate::error::{AppError, Result};
use crate::models::visited_street::visit_id;
use crate::models::{VisitedStreet, VisitedStreetInput};
use validator::Validate;

#[derive(Clone)]
pub struct VisitService {
    db: Datastore,
}

/// Outcome of a batch record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordSummary {
    pub inserted: usize,
    pub skipped: usize,
}

impl VisitService {
    pub fn new(db: Datastore) -> Self {
        Self { db }
    }

    /// Record a batch of visits for one session, skipping entries that are
    /// already stored.
    ///
    /// The whole batch is validated first. Writes are not atomic: the
    /// first storage failure aborts the rest, and earlier entries stay.
    pub async fn record_visited_streets(
        &self,
        user_id: &str,
        session_id: &str,
        visits: &[VisitedStreetInput],
    ) -> Result<RecordSummary> {
        if session_id.trim().is_empty() {
            return Err(AppError::BadRequest("sessionId is required".to_string()));
        }
        for visit in visits {
            visit.validate()?;
        }

        let mut summary = RecordSummary::default();
        for visit in visits {
            let id = visit_id(user_id, session_id, &visit.street_id, visit.entry_timestamp);
            if self.db.visited_street_exists(&id).await? {
                summary.skipped += 1;
                continue;
            }

            let record = VisitedStreet::from_input(user_id, session_id, visit);
            if self.db.create_visited_street(&record).await? {
                summary.inserted += 1;
            } else {
                summary.skipped += 1;
            }
        }

        tracing::info!(
            user_id,
            session_id,
            inserted = summary.inserted,
            skipped = summary.skipped,
            "Recorded visited streets"
        );
        Ok(summary)
    }

    pub async fn list_visited_streets(
        &self,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<Vec<VisitedStreet>> {
        self.db.list_visited_streets(user_id, session_id).await
    }
}
