// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visited-street routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{VisitedStreet, VisitedStreetInput};
use crate::routes::extract::ApiJson;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/visited-streets",
        post(record_visited_streets).get(list_visited_streets),
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordRequest {
    session_id: String,
    #[serde(default)]
    visits: Vec<VisitedStreetInput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordResponse {
    message: &'static str,
    inserted: usize,
    skipped: usize,
}

async fn record_visited_streets(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<RecordRequest>,
) -> Result<Json<RecordResponse>> {
    let summary = state
        .visits
        .record_visited_streets(&auth.user_id, &body.session_id, &body.visits)
        .await?;

    Ok(Json(RecordResponse {
        message: "Visited streets saved",
        inserted: summary.inserted,
        skipped: summary.skipped,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    session_id: Option<String>,
}

async fn list_visited_streets(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<VisitedStreet>>> {
    let visits = state
        .visits
        .list_visited_streets(&auth.user_id, params.session_id.as_deref())
        .await?;
    Ok(Json(visits))
}
