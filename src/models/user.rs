// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User profile stored in Firestore.
///
/// Name, email and avatar are owned by Clerk and overwritten on every sync.
/// Username, note and the tutorial flag are owned locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Clerk user ID (also used as document ID)
    pub id: String,
    /// Primary email address (empty if the provider has none)
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Display handle, searchable by friends
    pub user_name: Option<String>,
    /// Avatar URL
    pub image_url: Option<String>,
    /// Free-text "about me" note
    pub note: Option<String>,
    #[serde(default)]
    pub completed_tutorial: bool,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new user from the provider's profile.
    ///
    /// This is the only place the provider's username is copied.
    pub fn from_profile(id: &str, profile: &ProviderProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            user_name: profile.username.clone(),
            image_url: profile.image_url.clone(),
            note: None,
            completed_tutorial: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the provider-owned fields. Username is left alone.
    ///
    /// Absent provider names/avatar keep the stored value.
    pub fn apply_profile(&mut self, profile: &ProviderProfile, now: DateTime<Utc>) {
        self.email = profile.email.clone();
        if profile.first_name.is_some() {
            self.first_name = profile.first_name.clone();
        }
        if profile.last_name.is_some() {
            self.last_name = profile.last_name.clone();
        }
        if profile.image_url.is_some() {
            self.image_url = profile.image_url.clone();
        }
        self.updated_at = now;
    }

    /// Case-insensitive substring match on the username.
    ///
    /// `query_lower` must already be lowercased.
    pub fn username_contains(&self, query_lower: &str) -> bool {
        self.user_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(query_lower))
    }
}

/// Canonical profile fields supplied by the identity provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderProfile {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub image_url: Option<String>,
}

/// Partial user update. Only fields that are present are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub last_name: Option<String>,
    #[validate(custom(function = "validate_username"))]
    pub user_name: Option<String>,
    #[serde(alias = "imageURL")]
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: Option<String>,
    pub completed_tutorial: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.user_name.is_none()
            && self.image_url.is_none()
            && self.completed_tutorial.is_none()
    }

    /// Apply present fields. Returns whether anything was set.
    pub fn apply(&self, user: &mut User, now: DateTime<Utc>) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(first_name) = &self.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(user_name) = &self.user_name {
            user.user_name = Some(user_name.trim().to_string());
        }
        if let Some(image_url) = &self.image_url {
            user.image_url = Some(image_url.clone());
        }
        if let Some(completed) = self.completed_tutorial {
            user.completed_tutorial = completed;
        }
        user.updated_at = now;
        true
    }
}

/// Pick search results: usernames containing `query` (case-insensitive),
/// never `exclude_user_id`, ordered by username, at most `limit`.
pub fn search_candidates(
    users: impl IntoIterator<Item = User>,
    query: &str,
    exclude_user_id: &str,
    limit: usize,
) -> Vec<User> {
    let query_lower = query.to_lowercase();
    let mut matches: Vec<User> = users
        .into_iter()
        .filter(|u| u.id != exclude_user_id && u.username_contains(&query_lower))
        .collect();
    matches.sort_by_cached_key(|u| {
        (
            u.user_name.as_deref().unwrap_or_default().to_lowercase(),
            u.id.clone(),
        )
    });
    matches.truncate(limit);
    matches
}

pub const MAX_USERNAME_LEN: usize = 32;

/// Usernames are 1-32 characters after trimming.
pub fn validate_username(user_name: &str) -> Result<(), validator::ValidationError> {
    let len = user_name.trim().chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        let mut err = validator::ValidationError::new("username_length");
        err.message = Some("must be between 1 and 32 characters".into());
        return Err(err);
    }
    Ok(())
}
