// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Settings reads, location permission, and visited-street recording.

mod common;

use citystat_api::error::AppError;
use citystat_api::models::VisitedStreetInput;
use common::{create_test_app, FakeClerk};

fn visit(street_id: &str, entry_timestamp: i64) -> VisitedStreetInput {
    VisitedStreetInput {
        street_id: street_id.to_string(),
        street_name: format!("Street {}", street_id),
        entry_timestamp,
        exit_timestamp: Some(entry_timestamp + 30_000),
        duration_seconds: Some(30),
        entry_latitude: 42.6977,
        entry_longitude: 23.3219,
    }
}

#[tokio::test]
async fn settings_reads_never_create() {
    let clerk = FakeClerk::start().await;
    let (_app, state) = create_test_app(&clerk);

    assert!(matches!(
        state.settings.get_settings("u1").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        state.settings.save_location_permission("u1", true).await,
        Err(AppError::NotFound(_))
    ));
    assert!(!state.settings.get_location_permission("u1").await.unwrap());
    assert!(state.db.get_settings("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn location_permission_round_trip_after_provisioning() {
    let clerk = FakeClerk::start().await;
    clerk.add_user("u1", "a@x.com", None, None);
    let (_app, state) = create_test_app(&clerk);
    state.users.get_or_create("u1").await.unwrap();

    assert!(!state.settings.get_location_permission("u1").await.unwrap());

    let settings = state
        .settings
        .save_location_permission("u1", true)
        .await
        .unwrap();
    assert!(settings.enabled_location_tracking);
    assert!(state.settings.get_location_permission("u1").await.unwrap());
    assert!(
        state
            .settings
            .get_settings("u1")
            .await
            .unwrap()
            .enabled_location_tracking
    );
}

#[tokio::test]
async fn identical_visit_is_stored_once() {
    let clerk = FakeClerk::start().await;
    let (_app, state) = create_test_app(&clerk);

    let batch = vec![visit("s1", 1_000), visit("s2", 2_000)];
    let first = state
        .visits
        .record_visited_streets("u1", "session_a", &batch)
        .await
        .unwrap();
    assert_eq!(first.inserted, 2);

    let second = state
        .visits
        .record_visited_streets("u1", "session_a", &[visit("s1", 1_000)])
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 1);

    let stored = state
        .visits
        .list_visited_streets("u1", Some("session_a"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn same_street_in_another_session_is_a_new_visit() {
    let clerk = FakeClerk::start().await;
    let (_app, state) = create_test_app(&clerk);

    for session in ["session_a", "session_b"] {
        state
            .visits
            .record_visited_streets("u1", session, &[visit("s1", 1_000)])
            .await
            .unwrap();
    }

    assert_eq!(
        state
            .visits
            .list_visited_streets("u1", None)
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        state
            .visits
            .list_visited_streets("u1", Some("session_b"))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn visits_listed_by_entry_time() {
    let clerk = FakeClerk::start().await;
    let (_app, state) = create_test_app(&clerk);

    let batch = vec![visit("late", 3_000), visit("early", 1_000), visit("mid", 2_000)];
    state
        .visits
        .record_visited_streets("u1", "session_a", &batch)
        .await
        .unwrap();

    let order: Vec<_> = state
        .visits
        .list_visited_streets("u1", None)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.street_id)
        .collect();
    assert_eq!(order, vec!["early", "mid", "late"]);
}

#[tokio::test]
async fn invalid_batch_is_rejected_before_any_write() {
    let clerk = FakeClerk::start().await;
    let (_app, state) = create_test_app(&clerk);

    let mut bad = visit("s2", 2_000);
    bad.entry_latitude = 91.0;

    let result = state
        .visits
        .record_visited_streets("u1", "session_a", &[visit("s1", 1_000), bad])
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = state
        .visits
        .record_visited_streets("u1", " ", &[visit("s1", 1_000)])
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    assert!(state
        .visits
        .list_visited_streets("u1", None)
        .await
        .unwrap()
        .is_empty());
}
