// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for the signed-in user.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Settings, User};
use crate::routes::extract::ApiJson;
use crate::services::ProfileUpdate;
use crate::routes::response_timestamp;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user", get(get_user).put(update_profile))
        .route("/api/user/sync", post(sync_user))
        .route("/api/user/username", put(edit_username))
        .route("/api/user/note", put(edit_note))
        .route("/api/user/image", put(update_image))
}

/// User profile response.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub image_url: Option<String>,
    pub note: Option<String>,
    pub completed_tutorial: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            user_name: user.user_name,
            image_url: user.image_url,
            note: user.note,
            completed_tutorial: user.completed_tutorial,
            created_at: response_timestamp(user.created_at),
            updated_at: response_timestamp(user.updated_at),
        }
    }
}

/// User plus settings, returned by settings-touching updates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithSettings {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state.users.get_or_create(&auth.user_id).await?;
    Ok(Json(user.into()))
}

async fn sync_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    state.users.get_or_create(&auth.user_id).await?;
    let user = state.users.sync_from_provider(&auth.user_id).await?;
    Ok(Json(user.into()))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<UserWithSettings>> {
    let result = state.users.update_profile(&auth.user_id, &update).await?;
    Ok(Json(UserWithSettings {
        user: result.user.into(),
        settings: result.settings,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsernameRequest {
    user_name: String,
}

async fn edit_username(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<UsernameRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .edit_username(&auth.user_id, &body.user_name)
        .await?;
    Ok(Json(user.into()))
}

#[derive(Deserialize)]
struct NoteRequest {
    note: String,
}

async fn edit_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<NoteRequest>,
) -> Result<Json<UserResponse>> {
    let user = state.users.edit_note(&auth.user_id, &body.note).await?;
    Ok(Json(user.into()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest {
    #[serde(alias = "imageURL")]
    image_url: String,
}

async fn update_image(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<ImageRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .update_image(&auth.user_id, &body.image_url)
        .await?;
    Ok(Json(user.into()))
}
