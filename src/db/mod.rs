// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Datastore`] is the handle shared by every service. It talks to
//! Firestore in production and to an in-process store for tests and
//! `DATASTORE=memory` local runs. Both backends provide the same
//! guarantees:
//! - `create_*` is insert-if-absent and reports whether it inserted
//! - `delete_friend_edge` reports how many documents it removed
//! - list operations return the same ordering

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreBackend;
pub use memory::MemoryBackend;

use crate::config::{Config, DatastoreKind};
use crate::error::AppError;
use crate::models::{FriendEdge, Settings, User, VisitedStreet};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// One document per user, keyed by user ID
    pub const SETTINGS: &str = "settings";
    /// Directed friend edges, keyed by `user:friend`
    pub const FRIENDS: &str = "friends";
    pub const VISITED_STREETS: &str = "visited_streets";
}

/// Build a document ID from several parts.
///
/// Each part is percent-encoded, so the `:` separator is unambiguous and
/// IDs never contain `/`.
pub fn composite_id(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreBackend),
    Memory(Arc<MemoryBackend>),
}

/// Shared datastore handle. Cheap to clone.
#[derive(Clone)]
pub struct Datastore {
    backend: Backend,
}

impl Datastore {
    /// Connect to the backend selected in the config.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.datastore {
            DatastoreKind::Firestore => Self::firestore(&config.gcp_project_id).await,
            DatastoreKind::Memory => {
                tracing::warn!("Using in-memory datastore; data will not persist");
                Ok(Self::in_memory())
            }
        }
    }

    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreBackend::new(project_id).await?),
        })
    }

    /// Create an empty in-process datastore.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryBackend::default())),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.get_user(user_id).await,
            Backend::Memory(mem) => Ok(mem.get_user(user_id)),
        }
    }

    /// Insert a user unless one with the same ID exists.
    ///
    /// Returns `false` if the user already existed.
    pub async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.create_user(user).await,
            Backend::Memory(mem) => Ok(mem.create_user(user)),
        }
    }

    /// Create or overwrite a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.upsert_user(user).await,
            Backend::Memory(mem) => {
                mem.upsert_user(user);
                Ok(())
            }
        }
    }

    /// Up to `limit` users whose username contains `query` (case-insensitive),
    /// excluding `exclude_user_id`.
    pub async fn search_users(
        &self,
        query: &str,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<User>, AppError> {
        let users = match &self.backend {
            Backend::Firestore(fs) => fs.list_users().await?,
            Backend::Memory(mem) => mem.list_users(),
        };
        Ok(crate::models::user::search_candidates(
            users,
            query,
            exclude_user_id,
            limit,
        ))
    }

    // ─── Settings Operations ─────────────────────────────────────

    pub async fn get_settings(&self, user_id: &str) -> Result<Option<Settings>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.get_settings(user_id).await,
            Backend::Memory(mem) => Ok(mem.get_settings(user_id)),
        }
    }

    /// Insert settings unless the user already has a settings document.
    ///
    /// Returns `false` if one already existed.
    pub async fn create_settings(&self, settings: &Settings) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.create_settings(settings).await,
            Backend::Memory(mem) => Ok(mem.create_settings(settings)),
        }
    }

    pub async fn upsert_settings(&self, settings: &Settings) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.upsert_settings(settings).await,
            Backend::Memory(mem) => {
                mem.upsert_settings(settings);
                Ok(())
            }
        }
    }

    // ─── Friend Edge Operations ──────────────────────────────────

    /// Get the directed edge `user_id -> friend_id`.
    pub async fn get_friend_edge(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> Result<Option<FriendEdge>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.get_friend_edge(user_id, friend_id).await,
            Backend::Memory(mem) => Ok(mem.get_friend_edge(user_id, friend_id)),
        }
    }

    /// Insert an edge unless the same directed edge exists.
    ///
    /// Returns `false` if it already existed.
    pub async fn create_friend_edge(&self, edge: &FriendEdge) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.create_friend_edge(edge).await,
            Backend::Memory(mem) => Ok(mem.create_friend_edge(edge)),
        }
    }

    /// All edges from `user_id`, newest first.
    pub async fn list_friend_edges(&self, user_id: &str) -> Result<Vec<FriendEdge>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.list_friend_edges(user_id).await,
            Backend::Memory(mem) => Ok(mem.list_friend_edges(user_id)),
        }
    }

    /// Delete the directed edge `user_id -> friend_id`.
    ///
    /// Returns the number of edges removed (0 or 1).
    pub async fn delete_friend_edge(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> Result<usize, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.delete_friend_edge(user_id, friend_id).await,
            Backend::Memory(mem) => Ok(mem.delete_friend_edge(user_id, friend_id)),
        }
    }

    // ─── Visited Street Operations ───────────────────────────────

    pub async fn visited_street_exists(&self, visit_id: &str) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.visited_street_exists(visit_id).await,
            Backend::Memory(mem) => Ok(mem.visited_street_exists(visit_id)),
        }
    }

    /// Insert a visit unless the same visit exists.
    ///
    /// Returns `false` if it already existed.
    pub async fn create_visited_street(&self, visit: &VisitedStreet) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.create_visited_street(visit).await,
            Backend::Memory(mem) => Ok(mem.create_visited_street(visit)),
        }
    }

    /// Visits for a user (optionally a single session), oldest entry first.
    pub async fn list_visited_streets(
        &self,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<Vec<VisitedStreet>, AppError> {
        let mut visits = match &self.backend {
            Backend::Firestore(fs) => fs.list_visited_streets(user_id, session_id).await?,
            Backend::Memory(mem) => mem.list_visited_streets(user_id, session_id),
        };
        visits.sort_by(|a, b| {
            a.entry_timestamp
                .cmp(&b.entry_timestamp)
                .then_with(|| a.street_id.cmp(&b.street_id))
        });
        Ok(visits)
    }

    // ─── User Data Deletion ──────────────────────────────────────

    /// Delete a user and everything that references them:
    /// settings, friend edges in both directions, and visited streets.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let count = match &self.backend {
            Backend::Firestore(fs) => fs.delete_user_data(user_id).await?,
            Backend::Memory(mem) => mem.delete_user_data(user_id),
        };
        tracing::info!(user_id, deleted_count = count, "User data deletion complete");
        Ok(count)
    }
}
