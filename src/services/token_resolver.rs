// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolve a linked account to a usable NK access token.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::Credential;
use crate::services::nk_oauth::TokenExchange;

/// Per-account locks that serialize refreshes.
pub type RefreshLocks = Arc<DashMap<i64, Arc<Mutex<()>>>>;

/// Looks up stored credentials and refreshes expired access tokens.
#[derive(Clone)]
pub struct AccessTokenResolver {
    store: Arc<dyn CredentialStore>,
    exchange: Arc<dyn TokenExchange>,
    refresh_locks: RefreshLocks,
}

impl AccessTokenResolver {
    pub fn new(store: Arc<dyn CredentialStore>, exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            store,
            exchange,
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// Get an access token for `account_id`, refreshing it if it has expired.
    ///
    /// Fails with `NotFound { key: "accountId" }` if the account is not linked.
    /// A failed refresh is returned as is; the stale token is never used.
    pub async fn resolve(&self, account_id: i64) -> Result<String, AppError> {
        let credential = self.load(account_id).await?;
        if !credential.is_expired_at(Utc::now()) {
            return Ok(credential.access_token);
        }

        let lock = self
            .refresh_locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another task may have refreshed while we were waiting.
        let credential = self.load(account_id).await?;
        if !credential.is_expired_at(Utc::now()) {
            return Ok(credential.access_token);
        }

        tracing::info!(account_id, "Access token expired, refreshing");
        let grant = self.exchange.refresh(&credential.refresh_token).await?;

        // Token columns only: a rename or delete that lands during the
        // refresh must survive it.
        let expiry = grant.expires_at();
        let updated = self
            .store
            .update_tokens(account_id, &grant.access_token, &grant.refresh_token, expiry)
            .await?;
        if !updated {
            tracing::info!(account_id, "Account unlinked during token refresh");
            return Err(AppError::not_found("accountId"));
        }

        tracing::info!(account_id, expiry = %expiry, "Token refreshed");
        Ok(grant.access_token)
    }

    async fn load(&self, account_id: i64) -> Result<Credential, AppError> {
        self.store
            .find_credential(account_id)
            .await?
            .ok_or_else(|| AppError::not_found("accountId"))
    }
}
