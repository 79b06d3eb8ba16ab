// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod clerk;
pub mod friends;
pub mod session;
pub mod settings;
pub mod users;
pub mod visits;
pub mod webhook_signature;

pub use clerk::{ClerkClient, ProviderEvent};
pub use friends::{FriendCandidate, FriendService, InviteInfo};
pub use session::{SessionError, SessionVerifier};
pub use settings::SettingsService;
pub use users::{ProfileUpdate, UserService};
pub use visits::VisitService;
pub use webhook_signature::WebhookVerifier;
