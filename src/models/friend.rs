// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend edge model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// One directed friend edge: `user_id` has `friend_id` as a friend.
///
/// A friendship is two of these (A->B and B->A), written independently.
/// Profile fields are a snapshot of the friend taken when the edge was
/// written and are not kept in sync with the friend's user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEdge {
    /// Document ID, derived from (user_id, friend_id)
    pub id: String,
    pub user_id: String,
    pub friend_id: String,
    /// Friend's username at link time (empty if they had none)
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl FriendEdge {
    /// Build the edge `owner_id -> friend`, snapshotting the friend's profile.
    pub fn snapshot(owner_id: &str, friend: &User, now: DateTime<Utc>) -> Self {
        Self {
            id: edge_id(owner_id, &friend.id),
            user_id: owner_id.to_string(),
            friend_id: friend.id.clone(),
            user_name: friend.user_name.clone().unwrap_or_default(),
            first_name: friend.first_name.clone(),
            last_name: friend.last_name.clone(),
            image_url: friend.image_url.clone(),
            created_at: now,
        }
    }
}

/// Document ID for the directed edge `user_id -> friend_id`.
///
/// Deterministic so that each directed edge can exist at most once.
pub fn edge_id(user_id: &str, friend_id: &str) -> String {
    crate::db::composite_id(&[user_id, friend_id])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_ids_are_directional() {
        assert_ne!(edge_id("a", "b"), edge_id("b", "a"));
        assert_eq!(edge_id("a", "b"), edge_id("a", "b"));
    }

    #[test]
    fn snapshot_copies_friend_profile() {
        let now = Utc::now();
        let friend = User {
            id: "user_2".to_string(),
            email: "b@x.com".to_string(),
            first_name: Some("Boris".to_string()),
            last_name: None,
            user_name: None,
            image_url: Some("https://img.example.com/b.png".to_string()),
            note: None,
            completed_tutorial: true,
            created_at: now,
            updated_at: now,
        };

        let edge = FriendEdge::snapshot("user_1", &friend, now);
        assert_eq!(edge.user_id, "user_1");
        assert_eq!(edge.friend_id, "user_2");
        assert_eq!(edge.user_name, "");
        assert_eq!(edge.first_name.as_deref(), Some("Boris"));
        assert_eq!(edge.id, edge_id("user_1", "user_2"));
    }
}
