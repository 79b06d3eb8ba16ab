// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User provisioning and profile updates.
//!
//! A local user row is created lazily on first authenticated contact
//! (or by a Clerk webhook) and every provisioned user gets exactly one
//! settings row. Provider-owned fields (email, names, avatar) are
//! refreshed on sync; the username is only copied from Clerk at creation.

use crate::db::Datastore;
use crate::error::{AppError, Result};
use crate::models::{ProviderProfile, Settings, SettingsPatch, User, UserPatch};
use crate::services::clerk::{ClerkClient, ProviderEvent};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

/// Mixed profile update: user fields, or a nested `settings` object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub settings: Option<SettingsPatch>,
    #[serde(flatten)]
    pub user: UserPatch,
}

/// Result of [`UserService::update_profile`].
#[derive(Debug, Clone)]
pub struct ProfileUpdateResult {
    pub user: User,
    /// Present when the update was routed to settings.
    pub settings: Option<Settings>,
}

/// User provisioning service.
#[derive(Clone)]
pub struct UserService {
    db: Datastore,
    clerk: ClerkClient,
}

impl UserService {
    pub fn new(db: Datastore, clerk: ClerkClient) -> Self {
        Self { db, clerk }
    }

    /// Return the local user, provisioning it from Clerk if absent.
    ///
    /// An existing row is returned as-is; reads never re-sync.
    pub async fn get_or_create(&self, user_id: &str) -> Result<User> {
        if let Some(user) = self.db.get_user(user_id).await? {
            return Ok(user);
        }

        tracing::info!(user_id, "User not found locally, provisioning from Clerk");
        self.sync_from_provider(user_id).await
    }

    /// Refresh the local user from Clerk, creating it if needed.
    pub async fn sync_from_provider(&self, user_id: &str) -> Result<User> {
        let profile = self.clerk.get_user(user_id).await?;
        self.store_profile(user_id, &profile).await
    }

    /// Create or refresh a user from provider data, then make sure the
    /// user has settings.
    async fn store_profile(&self, user_id: &str, profile: &ProviderProfile) -> Result<User> {
        let now = Utc::now();

        let user = match self.db.get_user(user_id).await? {
            Some(mut existing) => {
                existing.apply_profile(profile, now);
                self.db.upsert_user(&existing).await?;
                tracing::debug!(user_id, "Synced existing user from provider");
                existing
            }
            None => {
                let user = User::from_profile(user_id, profile, now);
                if self.db.create_user(&user).await? {
                    tracing::info!(user_id, "Created user");
                    user
                } else {
                    // Lost a create race; refresh the row that won.
                    let mut existing = self.db.get_user(user_id).await?.ok_or_else(|| {
                        AppError::Database(format!("User {} vanished during create", user_id))
                    })?;
                    existing.apply_profile(profile, now);
                    self.db.upsert_user(&existing).await?;
                    existing
                }
            }
        };

        if let Err(e) = self.ensure_settings(user_id).await {
            tracing::warn!(user_id, error = %e, "Failed to ensure user settings");
        }

        Ok(user)
    }

    /// Make sure the user has a settings row, creating defaults if not.
    ///
    /// A concurrent create of the same row counts as success.
    pub async fn ensure_settings(&self, user_id: &str) -> Result<Settings> {
        if let Some(settings) = self.db.get_settings(user_id).await? {
            return Ok(settings);
        }

        let defaults = Settings::default_for(user_id);
        if self.db.create_settings(&defaults).await? {
            tracing::info!(user_id, "Created default settings");
            return Ok(defaults);
        }

        tracing::debug!(user_id, "Settings created concurrently");
        self.db
            .get_settings(user_id)
            .await?
            .ok_or_else(|| AppError::Database(format!("Settings for {} vanished", user_id)))
    }

    /// Apply the fields present in `patch`.
    ///
    /// With no recognised field this is a no-op returning the current row.
    pub async fn update(&self, user_id: &str, patch: &UserPatch) -> Result<User> {
        patch.validate()?;

        let mut user = self.get_or_create(user_id).await?;
        if patch.apply(&mut user, Utc::now()) {
            self.db.upsert_user(&user).await?;
            tracing::debug!(user_id, "Updated user profile");
        }

        Ok(user)
    }

    pub async fn edit_username(&self, user_id: &str, user_name: &str) -> Result<User> {
        let patch = UserPatch {
            user_name: Some(user_name.to_string()),
            ..Default::default()
        };
        self.update(user_id, &patch).await
    }

    pub async fn update_image(&self, user_id: &str, image_url: &str) -> Result<User> {
        let patch = UserPatch {
            image_url: Some(image_url.to_string()),
            ..Default::default()
        };
        self.update(user_id, &patch).await
    }

    /// Set the free-text note. Does not provision.
    pub async fn edit_note(&self, user_id: &str, note: &str) -> Result<User> {
        let mut user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        user.note = Some(note.to_string());
        user.updated_at = Utc::now();
        self.db.upsert_user(&user).await?;

        Ok(user)
    }

    /// Partial settings update, creating the settings row if missing.
    pub async fn update_settings(
        &self,
        user_id: &str,
        patch: &SettingsPatch,
    ) -> Result<(User, Settings)> {
        let user = self.get_or_create(user_id).await?;

        let (mut settings, existed) = match self.db.get_settings(user_id).await? {
            Some(settings) => (settings, true),
            None => (Settings::default_for(user_id), false),
        };

        if patch.apply(&mut settings) || !existed {
            self.db.upsert_settings(&settings).await?;
            tracing::debug!(user_id, created = !existed, "Saved settings");
        }

        Ok((user, settings))
    }

    /// Route a mixed payload: a `settings` object goes to settings,
    /// anything else is a user update.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdateResult> {
        if let Some(settings_patch) = &update.settings {
            let (user, settings) = self.update_settings(user_id, settings_patch).await?;
            return Ok(ProfileUpdateResult {
                user,
                settings: Some(settings),
            });
        }

        let user = self.update(user_id, &update.user).await?;
        Ok(ProfileUpdateResult {
            user,
            settings: None,
        })
    }

    /// Apply a Clerk webhook event. Returns a short acknowledgement.
    pub async fn apply_provider_event(&self, event: ProviderEvent) -> Result<&'static str> {
        match event {
            ProviderEvent::UserCreated(clerk_user) => {
                let user_id = clerk_user.id.clone();
                self.store_profile(&user_id, &clerk_user.into_profile())
                    .await?;
                Ok("User created")
            }
            ProviderEvent::UserUpdated(clerk_user) => {
                let user_id = clerk_user.id.clone();
                self.store_profile(&user_id, &clerk_user.into_profile())
                    .await?;
                Ok("User updated")
            }
            ProviderEvent::UserDeleted { id } => {
                let deleted = self.db.delete_user_data(&id).await?;
                tracing::info!(user_id = %id, deleted_count = deleted, "Deleted user");
                Ok("User deleted")
            }
            ProviderEvent::Other(event_type) => {
                tracing::info!(event_type = %event_type, "Ignoring unhandled webhook event");
                Ok("Event type not handled")
            }
        }
    }
}
