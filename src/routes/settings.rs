// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Settings and location-permission routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Settings, SettingsPatch};
use crate::routes::extract::ApiJson;
use crate::routes::users::UserWithSettings;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .route(
            "/api/location-permission",
            get(get_location_permission).put(save_location_permission),
        )
}

async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Settings>> {
    Ok(Json(state.settings.get_settings(&auth.user_id).await?))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(patch): ApiJson<SettingsPatch>,
) -> Result<Json<UserWithSettings>> {
    let (user, settings) = state.users.update_settings(&auth.user_id, &patch).await?;
    Ok(Json(UserWithSettings {
        user: user.into(),
        settings: Some(settings),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationPermission {
    enabled_location_tracking: bool,
}

async fn get_location_permission(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<LocationPermission>> {
    let enabled = state
        .settings
        .get_location_permission(&auth.user_id)
        .await?;
    Ok(Json(LocationPermission {
        enabled_location_tracking: enabled,
    }))
}

async fn save_location_permission(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<LocationPermission>,
) -> Result<Json<LocationPermission>> {
    let settings = state
        .settings
        .save_location_permission(&auth.user_id, body.enabled_location_tracking)
        .await?;
    Ok(Json(LocationPermission {
        enabled_location_tracking: settings.enabled_location_tracking,
    }))
}
