// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend and invite routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::FriendEdge;
use crate::routes::extract::ApiJson;
use crate::services::{FriendCandidate, InviteInfo};
use crate::routes::response_timestamp;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Routes that require a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/friends/search", get(search))
        .route("/api/friends/add", post(add_friend))
        .route("/api/friends/list", get(list_friends))
        .route("/api/friends/{friend_id}", delete(remove_friend))
        .route("/api/invite/link", get(invite_link))
        .route("/api/invite/accept", post(accept_invite))
}

/// Invite landing lookup; no session needed.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/invite", get(invite_info))
}

/// Friend list entry (snapshotted profile fields).
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FriendResponse {
    pub id: String,
    pub friend_id: String,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

impl From<FriendEdge> for FriendResponse {
    fn from(edge: FriendEdge) -> Self {
        Self {
            id: edge.id,
            friend_id: edge.friend_id,
            user_name: edge.user_name,
            first_name: edge.first_name,
            last_name: edge.last_name,
            image_url: edge.image_url,
            created_at: response_timestamp(edge.created_at),
        }
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Deserialize)]
struct SearchParams {
    username: Option<String>,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FriendCandidate>>> {
    let query = params.username.unwrap_or_default();
    let results = state.friends.search(&auth.user_id, &query).await?;
    Ok(Json(results))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct AddFriendRequest {
    #[validate(length(min = 1, message = "is required"))]
    friend_id: String,
}

async fn add_friend(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<AddFriendRequest>,
) -> Result<Json<FriendCandidate>> {
    body.validate()?;
    let friend = state
        .friends
        .add_friend(&auth.user_id, &body.friend_id)
        .await?;
    Ok(Json(friend))
}

async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<FriendResponse>>> {
    let edges = state.friends.list_friends(&auth.user_id).await?;
    Ok(Json(edges.into_iter().map(FriendResponse::from).collect()))
}

async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(friend_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .friends
        .remove_friend(&auth.user_id, &friend_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Friend removed",
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InviteLinkResponse {
    invite_link: String,
}

async fn invite_link(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<InviteLinkResponse>> {
    let invite_link = state.friends.invite_link(&auth.user_id).await?;
    Ok(Json(InviteLinkResponse { invite_link }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InviteParams {
    invited_by: Option<String>,
}

async fn invite_info(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InviteParams>,
) -> Result<Json<InviteInfo>> {
    let invited_by = params
        .invited_by
        .ok_or_else(|| AppError::BadRequest("invitedBy is required".to_string()))?;
    Ok(Json(state.friends.invite_info(&invited_by).await?))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct AcceptInviteRequest {
    #[validate(length(min = 1, message = "is required"))]
    invited_by: String,
}

async fn accept_invite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<AcceptInviteRequest>,
) -> Result<Json<FriendCandidate>> {
    body.validate()?;
    let friend = state
        .friends
        .accept_invite(&auth.user_id, &body.invited_by)
        .await?;
    Ok(Json(friend))
}
