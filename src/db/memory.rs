// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process datastore used for tests and `DATASTORE=memory`.
//!
//! Each collection is a `DashMap` keyed by document ID. Insert-if-absent
//! goes through the entry API so concurrent creates of the same ID race
//! the same way Firestore's `create` precondition does.

use crate::models::friend::edge_id;
use crate::models::{FriendEdge, Settings, User, VisitedStreet};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryBackend {
    users: DashMap<String, User>,
    settings: DashMap<String, Settings>,
    friends: DashMap<String, FriendEdge>,
    visits: DashMap<String, VisitedStreet>,
}

fn insert_if_absent<T: Clone>(map: &DashMap<String, T>, id: &str, value: &T) -> bool {
    match map.entry(id.to_string()) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            slot.insert(value.clone());
            true
        }
    }
}

impl MemoryBackend {
    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    pub fn create_user(&self, user: &User) -> bool {
        insert_if_absent(&self.users, &user.id, user)
    }

    pub fn upsert_user(&self, user: &User) {
        self.users.insert(user.id.clone(), user.clone());
    }

    pub fn list_users(&self) -> Vec<User> {
        self.users.iter().map(|u| u.value().clone()).collect()
    }

    pub fn get_settings(&self, user_id: &str) -> Option<Settings> {
        self.settings.get(user_id).map(|s| s.clone())
    }

    pub fn create_settings(&self, settings: &Settings) -> bool {
        insert_if_absent(&self.settings, &settings.user_id, settings)
    }

    pub fn upsert_settings(&self, settings: &Settings) {
        self.settings
            .insert(settings.user_id.clone(), settings.clone());
    }

    pub fn get_friend_edge(&self, user_id: &str, friend_id: &str) -> Option<FriendEdge> {
        self.friends
            .get(&edge_id(user_id, friend_id))
            .map(|e| e.clone())
    }

    pub fn create_friend_edge(&self, edge: &FriendEdge) -> bool {
        insert_if_absent(&self.friends, &edge.id, edge)
    }

    /// Newest first; ties broken by friend ID so the order is stable.
    pub fn list_friend_edges(&self, user_id: &str) -> Vec<FriendEdge> {
        let mut edges: Vec<FriendEdge> = self
            .friends
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        edges.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.friend_id.cmp(&b.friend_id))
        });
        edges
    }

    pub fn delete_friend_edge(&self, user_id: &str, friend_id: &str) -> usize {
        usize::from(self.friends.remove(&edge_id(user_id, friend_id)).is_some())
    }

    pub fn visited_street_exists(&self, visit_id: &str) -> bool {
        self.visits.contains_key(visit_id)
    }

    pub fn create_visited_street(&self, visit: &VisitedStreet) -> bool {
        insert_if_absent(&self.visits, &visit.id, visit)
    }

    pub fn list_visited_streets(&self, user_id: &str, session_id: Option<&str>) -> Vec<VisitedStreet> {
        self.visits
            .iter()
            .filter(|v| v.user_id == user_id)
            .filter(|v| session_id.is_none_or(|s| v.session_id == s))
            .map(|v| v.value().clone())
            .collect()
    }

    pub fn delete_user_data(&self, user_id: &str) -> usize {
        let mut deleted = 0;

        let before = self.friends.len();
        self.friends
            .retain(|_, e| e.user_id != user_id && e.friend_id != user_id);
        deleted += before - self.friends.len();

        let before = self.visits.len();
        self.visits.retain(|_, v| v.user_id != user_id);
        deleted += before - self.visits.len();

        deleted += usize::from(self.settings.remove(user_id).is_some());
        deleted += usize::from(self.users.remove(user_id).is_some());

        deleted
    }
}
