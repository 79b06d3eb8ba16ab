// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend graph: search, add, remove, list, and invite links.
//!
//! A friendship is two directed edges written independently. The forward
//! edge decides the outcome; the reciprocal edge is best-effort and a
//! failure there is only logged.

use crate::db::Datastore;
use crate::error::{AppError, Result};
use crate::models::{FriendEdge, User};
use crate::services::users::UserService;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Maximum number of search results.
pub const SEARCH_LIMIT: usize = 10;

/// A user as seen from the caller, with friend status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FriendCandidate {
    pub id: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub is_friend: bool,
}

impl FriendCandidate {
    fn from_user(user: &User, is_friend: bool) -> Self {
        Self {
            id: user.id.clone(),
            user_name: user.user_name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            image_url: user.image_url.clone(),
            is_friend,
        }
    }
}

/// Public view of the user behind an invite link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteInfo {
    pub invited_by: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct FriendService {
    db: Datastore,
    users: UserService,
    invite_base_url: String,
}

impl FriendService {
    pub fn new(db: Datastore, users: UserService, invite_base_url: impl Into<String>) -> Self {
        Self {
            db,
            users,
            invite_base_url: invite_base_url.into(),
        }
    }

    /// Users whose username contains `query`, annotated with whether the
    /// caller already has an edge to them.
    pub async fn search(&self, user_id: &str, query: &str) -> Result<Vec<FriendCandidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::BadRequest(
                "username query is required".to_string(),
            ));
        }

        let matches = self.db.search_users(query, user_id, SEARCH_LIMIT).await?;

        let friend_ids: HashSet<String> = self
            .db
            .list_friend_edges(user_id)
            .await?
            .into_iter()
            .map(|edge| edge.friend_id)
            .collect();

        Ok(matches
            .iter()
            .map(|user| FriendCandidate::from_user(user, friend_ids.contains(&user.id)))
            .collect())
    }

    /// Add `friend_id` as a friend of `user_id`, and the reverse.
    pub async fn add_friend(&self, user_id: &str, friend_id: &str) -> Result<FriendCandidate> {
        if user_id == friend_id {
            return Err(AppError::SelfFriend);
        }

        let friend = self
            .db
            .get_user(friend_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", friend_id)))?;

        if self.db.get_friend_edge(user_id, friend_id).await?.is_some() {
            return Err(AppError::AlreadyFriends);
        }

        let now = Utc::now();
        let forward = FriendEdge::snapshot(user_id, &friend, now);
        if !self.db.create_friend_edge(&forward).await? {
            // Concurrent add of the same edge
            return Err(AppError::AlreadyFriends);
        }
        tracing::info!(user_id, friend_id, "Added friend");

        self.add_reciprocal(user_id, &friend).await;

        Ok(FriendCandidate::from_user(&friend, true))
    }

    /// Best-effort `friend -> user` edge with a fresh snapshot of the user.
    async fn add_reciprocal(&self, user_id: &str, friend: &User) {
        match self.create_reciprocal(user_id, friend).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id, friend_id = %friend.id, "Reciprocal edge already present");
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    friend_id = %friend.id,
                    error = %e,
                    "Failed to create reciprocal friend edge"
                );
            }
        }
    }

    async fn create_reciprocal(&self, user_id: &str, friend: &User) -> Result<bool> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        let edge = FriendEdge::snapshot(&friend.id, &user, Utc::now());
        self.db.create_friend_edge(&edge).await
    }

    /// Remove the `user -> friend` edge and, best-effort, the reverse.
    pub async fn remove_friend(&self, user_id: &str, friend_id: &str) -> Result<()> {
        let removed = self.db.delete_friend_edge(user_id, friend_id).await?;
        if removed == 0 {
            return Err(AppError::NotFound("Friend relationship not found".to_string()));
        }
        tracing::info!(user_id, friend_id, "Removed friend");

        match self.db.delete_friend_edge(friend_id, user_id).await {
            Ok(0) => tracing::debug!(user_id, friend_id, "No reciprocal edge to remove"),
            Ok(_) => {}
            Err(e) => tracing::warn!(
                user_id,
                friend_id,
                error = %e,
                "Failed to remove reciprocal friend edge"
            ),
        }

        Ok(())
    }

    /// Edges from `user_id`, newest first, with snapshotted friend fields.
    pub async fn list_friends(&self, user_id: &str) -> Result<Vec<FriendEdge>> {
        self.db.list_friend_edges(user_id).await
    }

    /// Shareable invite link for the caller.
    pub async fn invite_link(&self, user_id: &str) -> Result<String> {
        let user = self.users.get_or_create(user_id).await?;
        Ok(build_invite_link(
            &self.invite_base_url,
            &user.id,
            user.user_name.as_deref(),
        ))
    }

    /// Resolve the inviting user of an invite link.
    pub async fn invite_info(&self, invited_by: &str) -> Result<InviteInfo> {
        let invited_by = invited_by.trim();
        if invited_by.is_empty() {
            return Err(AppError::NotFound("Invalid invite link".to_string()));
        }

        let user = match self.users.get_or_create(invited_by).await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(invited_by, error = %e, "Invite lookup failed");
                return Err(AppError::NotFound("Invalid invite link".to_string()));
            }
        };

        Ok(InviteInfo {
            invited_by: user.id,
            user_name: user.user_name,
            first_name: user.first_name,
            last_name: user.last_name,
            image_url: user.image_url,
        })
    }

    /// Accepting an invite is the same as adding the inviter as a friend.
    pub async fn accept_invite(&self, user_id: &str, invited_by: &str) -> Result<FriendCandidate> {
        self.add_friend(user_id, invited_by).await
    }
}

fn build_invite_link(base_url: &str, user_id: &str, user_name: Option<&str>) -> String {
    let mut link = format!("{}?invitedBy={}", base_url, urlencoding::encode(user_id));
    if let Some(name) = user_name.filter(|n| !n.is_empty()) {
        link.push_str("&userName=");
        link.push_str(&urlencoding::encode(name));
    }
    link
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_link_encodes_parameters() {
        assert_eq!(
            build_invite_link("https://citystat.app/invite", "user_1", Some("Ana P")),
            "https://citystat.app/invite?invitedBy=user_1&userName=Ana%20P"
        );
        assert_eq!(
            build_invite_link("https://citystat.app/invite", "user_1", None),
            "https://citystat.app/invite?invitedBy=user_1"
        );
    }
}
