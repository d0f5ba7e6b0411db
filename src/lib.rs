// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! NK Dashboard: browse NK SpeedCoach rowing data
//!
//! This crate provides the backend API that links NK Logbook accounts via
//! OAuth and serves their sessions, strokes and devices.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod time_utils;

use config::Config;
use db::CredentialStore;
use middleware::RateLimiter;
use services::{
    AccessTokenResolver, MemoryStorage, NkApiClient, NkOAuthClient, RedirectHandshake,
    TokenExchange,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn CredentialStore>,
    pub oauth: Arc<dyn TokenExchange>,
    pub nk_api: NkApiClient,
    pub resolver: AccessTokenResolver,
    pub handshake: RedirectHandshake<MemoryStorage>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire up the NK clients described by `config` around `store`.
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Self {
        let oauth: Arc<dyn TokenExchange> = Arc::new(NkOAuthClient::from_config(&config));
        Self::with_token_exchange(config, store, oauth)
    }

    pub fn with_token_exchange(
        config: Config,
        store: Arc<dyn CredentialStore>,
        oauth: Arc<dyn TokenExchange>,
    ) -> Self {
        let resolver = AccessTokenResolver::new(store.clone(), oauth.clone());
        let handshake = RedirectHandshake::from_config(MemoryStorage::new(), &config);
        let rate_limiter = Arc::new(RateLimiter::per_second(config.rate_limit_per_second));

        Self {
            nk_api: NkApiClient::from_config(&config),
            config,
            store,
            oauth,
            resolver,
            handshake,
            rate_limiter,
        }
    }
}
