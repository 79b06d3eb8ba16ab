// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clerk webhook ingestion through the router.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use citystat_api::config::Config;
use citystat_api::services::WebhookVerifier;
use common::{create_test_app, send, FakeClerk};
use serde_json::{json, Value};

fn signed_request(body: &str, timestamp: i64) -> Request<Body> {
    let verifier = WebhookVerifier::new(&Config::test_default().clerk_webhook_secret).unwrap();
    let signature = verifier.sign("msg_test", timestamp, body.as_bytes());

    Request::builder()
        .method("POST")
        .uri("/webhooks/clerk")
        .header(header::CONTENT_TYPE, "application/json")
        .header("svix-id", "msg_test")
        .header("svix-timestamp", timestamp.to_string())
        .header("svix-signature", format!("v1,{}", signature))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn user_event(event_type: &str, id: &str, email: &str) -> Value {
    json!({
        "type": event_type,
        "data": {
            "id": id,
            "email_addresses": [{ "id": "e1", "email_address": email }],
            "primary_email_address_id": "e1",
            "first_name": "Nia",
            "last_name": "Stoyanova",
            "username": "nia",
            "image_url": "https://img.clerk.com/nia.png"
        }
    })
}

#[tokio::test]
async fn user_lifecycle_via_webhooks() {
    let clerk = FakeClerk::start().await;
    let (app, state) = create_test_app(&clerk);

    let body = user_event("user.created", "u9", "n@x.com").to_string();
    let (status, response) = send(&app, signed_request(&body, now())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "User created");

    let user = state.db.get_user("u9").await.unwrap().unwrap();
    assert_eq!(user.email, "n@x.com");
    assert_eq!(user.image_url.as_deref(), Some("https://img.clerk.com/nia.png"));
    assert!(state.db.get_settings("u9").await.unwrap().is_some());

    let body = user_event("user.updated", "u9", "nia@x.com").to_string();
    let (status, _) = send(&app, signed_request(&body, now())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        state.db.get_user("u9").await.unwrap().unwrap().email,
        "nia@x.com"
    );

    let body = json!({ "type": "user.deleted", "data": { "id": "u9", "deleted": true } })
        .to_string();
    let (status, response) = send(&app, signed_request(&body, now())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "User deleted");
    assert!(state.db.get_user("u9").await.unwrap().is_none());
}

#[tokio::test]
async fn deleted_user_loses_friend_edges_and_visits() {
    let clerk = FakeClerk::start().await;
    clerk.add_user("u1", "a@x.com", None, Some("ana"));
    clerk.add_user("u2", "b@x.com", None, Some("boris"));
    let (app, state) = create_test_app(&clerk);

    state.users.get_or_create("u1").await.unwrap();
    state.users.get_or_create("u2").await.unwrap();
    state.friends.add_friend("u1", "u2").await.unwrap();
    state
        .visits
        .record_visited_streets(
            "u2",
            "session_a",
            &[serde_json::from_value(json!({
                "streetId": "s1",
                "entryTimestamp": 1000,
                "entryLatitude": 0.0,
                "entryLongitude": 0.0
            }))
            .unwrap()],
        )
        .await
        .unwrap();

    let body = json!({ "type": "user.deleted", "data": { "id": "u2" } }).to_string();
    let (status, _) = send(&app, signed_request(&body, now())).await;
    assert_eq!(status, StatusCode::OK);

    assert!(state.friends.list_friends("u1").await.unwrap().is_empty());
    assert!(state
        .visits
        .list_visited_streets("u2", None)
        .await
        .unwrap()
        .is_empty());
    assert!(state.db.get_user("u1").await.unwrap().is_some());
}

#[tokio::test]
async fn unhandled_event_is_acknowledged() {
    let clerk = FakeClerk::start().await;
    let (app, _state) = create_test_app(&clerk);

    let body = json!({ "type": "session.created", "data": {} }).to_string();
    let (status, response) = send(&app, signed_request(&body, now())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "Event type not handled");
}

#[tokio::test]
async fn bad_signatures_are_rejected() {
    let clerk = FakeClerk::start().await;
    let (app, state) = create_test_app(&clerk);
    let body = user_event("user.created", "u9", "n@x.com").to_string();

    // Signed for a different body
    let mut request = signed_request("{}", now());
    *request.body_mut() = Body::from(body.clone());
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Too old
    let (status, _) = send(&app, signed_request(&body, now() - 600)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // No svix headers at all
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/clerk")
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(state.db.get_user("u9").await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_signed_payload_is_bad_request() {
    let clerk = FakeClerk::start().await;
    let (app, _state) = create_test_app(&clerk);

    let (status, body) = send(&app, signed_request("{not json", now())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}
