// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Settings (one document per user)
//! - Friends (directed edges)
//! - Visited streets (append-only visit log)

use crate::db::collections;
use crate::error::AppError;
use crate::models::friend::edge_id;
use crate::models::{FriendEdge, Settings, User, VisitedStreet};
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore-backed storage.
#[derive(Clone)]
pub struct FirestoreBackend {
    client: firestore::FirestoreDb,
}

impl FirestoreBackend {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Generic Helpers ─────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, doc_id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, doc_id: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id)
            .object(value)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create a document only if the ID is free.
    ///
    /// Returns `false` when Firestore reports the document already exists.
    async fn insert_doc<T>(
        &self,
        collection: &str,
        doc_id: &str,
        value: &T,
    ) -> Result<bool, AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let result: Result<(), FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collection)
            .document_id(doc_id)
            .object(value)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(collection, doc_id, "Document already exists");
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Delete a document that must exist.
    ///
    /// Returns 1 if a document was deleted, 0 if there was none.
    async fn delete_existing_doc(&self, collection: &str, doc_id: &str) -> Result<usize, AppError> {
        let result = self
            .client
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id)
            .precondition(firestore::FirestoreWritePrecondition::Exists(true))
            .execute()
            .await;

        match result {
            Ok(()) => Ok(1),
            Err(FirestoreError::DataNotFoundError(_)) => Ok(0),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete(&self, collection: &str, doc_ids: &[String]) -> Result<(), AppError> {
        for chunk in doc_ids.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    pub async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        self.insert_doc(collections::USERS, &user.id, user).await
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.id, user).await
    }

    /// All user profiles.
    ///
    /// Firestore has no substring operator, so username search filters
    /// in-process over the full collection.
    // TODO: replace with a prefix index on a lowercased username field once the user count warrants it
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Settings Operations ─────────────────────────────────────

    pub async fn get_settings(&self, user_id: &str) -> Result<Option<Settings>, AppError> {
        self.get_doc(collections::SETTINGS, user_id).await
    }

    pub async fn create_settings(&self, settings: &Settings) -> Result<bool, AppError> {
        self.insert_doc(collections::SETTINGS, &settings.user_id, settings)
            .await
    }

    pub async fn upsert_settings(&self, settings: &Settings) -> Result<(), AppError> {
        self.set_doc(collections::SETTINGS, &settings.user_id, settings)
            .await
    }

    // ─── Friend Edge Operations ──────────────────────────────────

    pub async fn get_friend_edge(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> Result<Option<FriendEdge>, AppError> {
        self.get_doc(collections::FRIENDS, &edge_id(user_id, friend_id))
            .await
    }

    pub async fn create_friend_edge(&self, edge: &FriendEdge) -> Result<bool, AppError> {
        self.insert_doc(collections::FRIENDS, &edge.id, edge).await
    }

    pub async fn list_friend_edges(&self, user_id: &str) -> Result<Vec<FriendEdge>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::FRIENDS)
            .filter(|q| q.for_all([q.field("userId").eq(user_id)]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn delete_friend_edge(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> Result<usize, AppError> {
        self.delete_existing_doc(collections::FRIENDS, &edge_id(user_id, friend_id))
            .await
    }

    /// Edges where `field` equals `user_id` (used for cascading deletes).
    async fn friend_edges_by(&self, field: &str, user_id: &str) -> Result<Vec<FriendEdge>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::FRIENDS)
            .filter(|q| q.for_all([q.field(field).eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Visited Street Operations ───────────────────────────────

    pub async fn visited_street_exists(&self, visit_id: &str) -> Result<bool, AppError> {
        let visit: Option<VisitedStreet> =
            self.get_doc(collections::VISITED_STREETS, visit_id).await?;
        Ok(visit.is_some())
    }

    pub async fn create_visited_street(&self, visit: &VisitedStreet) -> Result<bool, AppError> {
        self.insert_doc(collections::VISITED_STREETS, &visit.id, visit)
            .await
    }

    pub async fn list_visited_streets(
        &self,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<Vec<VisitedStreet>, AppError> {
        let query = self
            .client
            .fluent()
            .select()
            .from(collections::VISITED_STREETS);

        let query = if let Some(session_id) = session_id {
            query.filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id),
                    q.field("sessionId").eq(session_id),
                ])
            })
        } else {
            query.filter(move |q| q.for_all([q.field("userId").eq(user_id)]))
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Data Deletion ──────────────────────────────────────

    /// Delete a user and all dependent documents.
    ///
    /// Deletes:
    /// - `friends` where the user is either end of the edge
    /// - `visited_streets` (query by userId)
    /// - `settings/{user_id}`
    /// - `users/{user_id}`
    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Friend edges in both directions
        let mut edge_ids: Vec<String> = self
            .friend_edges_by("userId", user_id)
            .await?
            .into_iter()
            .map(|edge| edge.id)
            .collect();
        edge_ids.extend(
            self.friend_edges_by("friendId", user_id)
                .await?
                .into_iter()
                .map(|edge| edge.id),
        );
        edge_ids.sort();
        edge_ids.dedup();

        self.batch_delete(collections::FRIENDS, &edge_ids).await?;
        deleted_count += edge_ids.len();
        tracing::debug!(user_id, count = edge_ids.len(), "Deleted friend edges");

        // 2. Visited streets
        let visit_ids: Vec<String> = self
            .list_visited_streets(user_id, None)
            .await?
            .into_iter()
            .map(|visit| visit.id)
            .collect();

        self.batch_delete(collections::VISITED_STREETS, &visit_ids)
            .await?;
        deleted_count += visit_ids.len();
        tracing::debug!(user_id, count = visit_ids.len(), "Deleted visited streets");

        // 3. Settings and 4. user profile
        deleted_count += self
            .delete_existing_doc(collections::SETTINGS, user_id)
            .await?;
        deleted_count += self.delete_existing_doc(collections::USERS, user_id).await?;

        Ok(deleted_count)
    }
}
