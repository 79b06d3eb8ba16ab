// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend graph behaviour: symmetric edges, duplicates, removal, search.

mod common;

use citystat_api::error::AppError;
use citystat_api::AppState;
use common::{create_test_app, FakeClerk};
use std::sync::Arc;

/// App with users u1..u3 already provisioned.
async fn setup() -> (FakeClerk, Arc<AppState>) {
    let clerk = FakeClerk::start().await;
    clerk.add_user("u1", "a@x.com", Some("Ana"), Some("ana"));
    clerk.add_user("u2", "b@x.com", Some("Boris"), Some("boris"));
    clerk.add_user("u3", "c@x.com", Some("Cveta"), Some("Cveta_walks"));
    let (_app, state) = create_test_app(&clerk);

    for id in ["u1", "u2", "u3"] {
        state.users.get_or_create(id).await.unwrap();
    }
    (clerk, state)
}

#[tokio::test]
async fn add_friend_creates_both_edges() {
    let (_clerk, state) = setup().await;

    let friend = state.friends.add_friend("u1", "u2").await.unwrap();
    assert_eq!(friend.id, "u2");
    assert!(friend.is_friend);
    assert_eq!(friend.user_name.as_deref(), Some("boris"));

    let forward = state.friends.list_friends("u1").await.unwrap();
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].friend_id, "u2");
    assert_eq!(forward[0].user_name, "boris");

    let reverse = state.friends.list_friends("u2").await.unwrap();
    assert_eq!(reverse.len(), 1);
    assert_eq!(reverse[0].friend_id, "u1");
    assert_eq!(reverse[0].first_name.as_deref(), Some("Ana"));
}

#[tokio::test]
async fn failed_reciprocal_edge_does_not_fail_add() {
    let (_clerk, state) = setup().await;

    // No local row for the caller, so the reverse edge has nothing to snapshot.
    let friend = state.friends.add_friend("ghost", "u2").await.unwrap();
    assert_eq!(friend.id, "u2");
    assert!(friend.is_friend);

    let forward = state.friends.list_friends("ghost").await.unwrap();
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].friend_id, "u2");

    assert!(state.friends.list_friends("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn self_friend_always_fails() {
    let (_clerk, state) = setup().await;

    assert!(matches!(
        state.friends.add_friend("u1", "u1").await,
        Err(AppError::SelfFriend)
    ));
    assert!(matches!(
        state.friends.add_friend("nobody", "nobody").await,
        Err(AppError::SelfFriend)
    ));
}

#[tokio::test]
async fn adding_twice_fails_with_already_friends() {
    let (_clerk, state) = setup().await;

    state.friends.add_friend("u1", "u2").await.unwrap();
    assert!(matches!(
        state.friends.add_friend("u1", "u2").await,
        Err(AppError::AlreadyFriends)
    ));
    assert_eq!(state.friends.list_friends("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn reverse_add_after_reciprocal_fails_as_duplicate() {
    let (_clerk, state) = setup().await;

    state.friends.add_friend("u1", "u2").await.unwrap();
    // u2 -> u1 was written as the reciprocal edge
    assert!(matches!(
        state.friends.add_friend("u2", "u1").await,
        Err(AppError::AlreadyFriends)
    ));
}

#[tokio::test]
async fn adding_unknown_user_is_not_found() {
    let (_clerk, state) = setup().await;

    assert!(matches!(
        state.friends.add_friend("u1", "missing").await,
        Err(AppError::NotFound(_))
    ));
    assert!(state.friends.list_friends("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_adds_create_one_edge() {
    let (_clerk, state) = setup().await;

    let (a, b) = tokio::join!(
        state.friends.add_friend("u1", "u2"),
        state.friends.add_friend("u1", "u2")
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(state.friends.list_friends("u1").await.unwrap().len(), 1);
    assert_eq!(state.friends.list_friends("u2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn remove_friend_removes_both_edges_once() {
    let (_clerk, state) = setup().await;

    assert!(matches!(
        state.friends.remove_friend("u1", "u2").await,
        Err(AppError::NotFound(_))
    ));

    state.friends.add_friend("u1", "u2").await.unwrap();
    state.friends.remove_friend("u1", "u2").await.unwrap();

    assert!(state.friends.list_friends("u1").await.unwrap().is_empty());
    assert!(state.friends.list_friends("u2").await.unwrap().is_empty());
    assert!(matches!(
        state.friends.remove_friend("u1", "u2").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn remove_succeeds_without_reciprocal_edge() {
    let (_clerk, state) = setup().await;

    state.friends.add_friend("u1", "u2").await.unwrap();
    state.db.delete_friend_edge("u2", "u1").await.unwrap();

    state.friends.remove_friend("u1", "u2").await.unwrap();
    assert!(state.friends.list_friends("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn list_is_newest_first() {
    let (_clerk, state) = setup().await;

    state.friends.add_friend("u1", "u2").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    state.friends.add_friend("u1", "u3").await.unwrap();

    let ids: Vec<_> = state
        .friends
        .list_friends("u1")
        .await
        .unwrap()
        .into_iter()
        .map(|edge| edge.friend_id)
        .collect();
    assert_eq!(ids, vec!["u3", "u2"]);
}

#[tokio::test]
async fn snapshot_is_refreshed_by_next_add() {
    let (_clerk, state) = setup().await;

    state.friends.add_friend("u1", "u2").await.unwrap();
    state.users.edit_username("u2", "boris_the_walker").await.unwrap();

    let edges = state.friends.list_friends("u1").await.unwrap();
    assert_eq!(edges[0].user_name, "boris");

    state.friends.remove_friend("u1", "u2").await.unwrap();
    state.friends.add_friend("u1", "u2").await.unwrap();

    let edges = state.friends.list_friends("u1").await.unwrap();
    assert_eq!(edges[0].user_name, "boris_the_walker");
}

#[tokio::test]
async fn search_excludes_caller_and_flags_friends() {
    let (_clerk, state) = setup().await;
    state.friends.add_friend("u1", "u3").await.unwrap();

    let results = state.friends.search("u1", "  A ").await.unwrap();
    let found: Vec<_> = results
        .iter()
        .map(|r| (r.id.as_str(), r.is_friend))
        .collect();
    assert_eq!(found, vec![("u3", true)]);

    let results = state.friends.search("u2", "O").await.unwrap();
    let found: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert!(found.is_empty());

    let results = state.friends.search("u3", "a").await.unwrap();
    let found: Vec<_> = results
        .iter()
        .map(|r| (r.id.as_str(), r.is_friend))
        .collect();
    assert_eq!(found, vec![("u1", true)]);
}

#[tokio::test]
async fn search_rejects_blank_query() {
    let (_clerk, state) = setup().await;

    assert!(matches!(
        state.friends.search("u1", "   ").await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn invite_flow() {
    let (_clerk, state) = setup().await;

    let link = state.friends.invite_link("u1").await.unwrap();
    assert_eq!(link, "https://citystat.app/invite?invitedBy=u1&userName=ana");

    let info = state.friends.invite_info("u1").await.unwrap();
    assert_eq!(info.invited_by, "u1");
    assert_eq!(info.first_name.as_deref(), Some("Ana"));

    assert!(matches!(
        state.friends.invite_info("missing").await,
        Err(AppError::NotFound(_))
    ));

    let friend = state.friends.accept_invite("u2", "u1").await.unwrap();
    assert_eq!(friend.id, "u1");
    assert_eq!(state.friends.list_friends("u1").await.unwrap().len(), 1);
}
