// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CityStat API: profiles, friends, settings and street visits for the
//! CityStat city exploration app.
//!
//! Identity lives in Clerk; this crate keeps the local profile, the
//! friend graph, per-user settings and the log of visited street segments.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Datastore;
use services::{
    ClerkClient, FriendService, SessionVerifier, SettingsService, UserService, VisitService,
    WebhookVerifier,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Datastore,
    pub users: UserService,
    pub friends: FriendService,
    pub settings: SettingsService,
    pub visits: VisitService,
    pub session_verifier: SessionVerifier,
    pub webhook_verifier: WebhookVerifier,
}

impl AppState {
    /// Wire up every service around one datastore handle.
    pub fn new(config: Config, db: Datastore) -> anyhow::Result<Self> {
        let clerk = ClerkClient::new(
            config.clerk_api_url.clone(),
            config.clerk_secret_key.clone(),
        );
        let users = UserService::new(db.clone(), clerk);
        let friends = FriendService::new(
            db.clone(),
            users.clone(),
            config.invite_base_url.clone(),
        );
        let settings = SettingsService::new(db.clone());
        let visits = VisitService::new(db.clone());
        let session_verifier = SessionVerifier::new(&config)?;
        let webhook_verifier = WebhookVerifier::new(&config.clerk_webhook_secret)
            .map_err(|e| anyhow::anyhow!("CLERK_WEBHOOK_SECRET: {}", e))?;

        Ok(Self {
            config,
            db,
            users,
            friends,
            settings,
            visits,
            session_verifier,
            webhook_verifier,
        })
    }
}
