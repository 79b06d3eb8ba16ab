// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use citystat_api::config::Config;
use citystat_api::db::Datastore;
use citystat_api::routes::create_router;
use citystat_api::AppState;
use dashmap::DashMap;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

// ─── Fake Clerk ──────────────────────────────────────────────

#[derive(Default)]
struct FakeClerkState {
    users: DashMap<String, Value>,
    lookups: AtomicUsize,
}

/// Clerk Backend API stand-in served on an ephemeral local port.
#[derive(Clone)]
pub struct FakeClerk {
    pub base_url: String,
    state: Arc<FakeClerkState>,
}

#[allow(dead_code)]
impl FakeClerk {
    pub async fn start() -> Self {
        let state = Arc::new(FakeClerkState::default());
        let app = Router::new()
            .route("/users/{id}", get(fake_get_user))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Register a user with a single primary email.
    pub fn add_user(&self, id: &str, email: &str, first_name: Option<&str>, username: Option<&str>) {
        self.add_raw_user(json!({
            "id": id,
            "email_addresses": [{ "id": "idn_primary", "email_address": email }],
            "primary_email_address_id": "idn_primary",
            "first_name": first_name,
            "last_name": null,
            "username": username,
            "image_url": ""
        }));
    }

    /// Register a user object exactly as Clerk would return it.
    pub fn add_raw_user(&self, user: Value) {
        let id = user["id"].as_str().unwrap().to_string();
        self.state.users.insert(id, user);
    }

    /// Number of `GET /users/{id}` calls served.
    pub fn lookups(&self) -> usize {
        self.state.lookups.load(Ordering::SeqCst)
    }
}

async fn fake_get_user(
    State(state): State<Arc<FakeClerkState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.lookups.fetch_add(1, Ordering::SeqCst);

    let expected = format!("Bearer {}", Config::test_default().clerk_secret_key);
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "errors": [] })));
    }

    match state.users.get(&id) {
        Some(user) => (StatusCode::OK, Json(user.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "errors": [{ "code": "resource_not_found" }] })),
        ),
    }
}

// ─── App Construction ────────────────────────────────────────

/// Create a test app backed by the in-memory datastore and the given
/// fake Clerk. Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(clerk: &FakeClerk) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.clerk_api_url = clerk.base_url.clone();
    config.clerk_jwks_url = format!("{}/jwks", clerk.base_url);

    let state = Arc::new(AppState::new(config, Datastore::in_memory()).unwrap());
    (create_router(state.clone()), state)
}

/// HS256 session token for `user_id`, signed with the test key.
#[allow(dead_code)]
pub fn session_token(user_id: &str) -> String {
    let key = Config::test_default().session_signing_key.unwrap();
    let exp = chrono::Utc::now().timestamp() + 3600;
    encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": user_id, "exp": exp }),
        &EncodingKey::from_secret(&key),
    )
    .unwrap()
}

/// Build a request authenticated as `user_id` via the Bearer header.
#[allow(dead_code)]
pub fn authed(method: &str, uri: &str, user_id: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", session_token(user_id)));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the JSON response body (Null when empty).
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
