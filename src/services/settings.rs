// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Settings reads and the location-permission toggle.
//!
//! These paths never create a settings row; provisioning does that.

use crate::db::Datastore;
use crate::error::{AppError, Result};
use crate::models::Settings;

#[derive(Clone)]
pub struct SettingsService {
    db: Datastore,
}

impl SettingsService {
    pub fn new(db: Datastore) -> Self {
        Self { db }
    }

    pub async fn get_settings(&self, user_id: &str) -> Result<Settings> {
        self.db
            .get_settings(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Settings for user {} not found", user_id)))
    }

    /// Whether location tracking is enabled; `false` without a settings row.
    pub async fn get_location_permission(&self, user_id: &str) -> Result<bool> {
        Ok(self
            .db
            .get_settings(user_id)
            .await?
            .is_some_and(|s| s.enabled_location_tracking))
    }

    pub async fn save_location_permission(&self, user_id: &str, enabled: bool) -> Result<Settings> {
        let mut settings = self.get_settings(user_id).await?;
        settings.enabled_location_tracking = enabled;
        self.db.upsert_settings(&settings).await?;

        tracing::info!(user_id, enabled, "Saved location permission");
        Ok(settings)
    }
}
