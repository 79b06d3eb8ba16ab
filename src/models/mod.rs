// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod friend;
pub mod settings;
pub mod user;
pub mod visited_street;

pub use friend::FriendEdge;
pub use settings::{Settings, SettingsPatch};
pub use user::{ProviderProfile, User, UserPatch};
pub use visited_street::{VisitedStreet, VisitedStreetInput};
