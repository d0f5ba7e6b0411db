// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Linked NK account: stored credential and API shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored OAuth credential for one linked NK athlete.
///
/// Keyed by the NK-assigned `user_id`; at most one row per user.
#[derive(Clone, PartialEq, sqlx::FromRow)]
pub struct Credential {
    /// NK user ID (primary key)
    pub user_id: i64,
    /// NK team ID of the user
    pub own_team_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Bearer token for the NK Logbook API
    pub access_token: String,
    /// Token used to obtain a new access token
    pub refresh_token: String,
    /// When `access_token` stops being valid
    pub token_expiry: DateTime<Utc>,
}

impl Credential {
    /// Whether the access token has expired as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.token_expiry
    }
}

// Tokens never go to logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("own_team_id", &self.own_team_id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("token_expiry", &self.token_expiry)
            .finish_non_exhaustive()
    }
}

/// Public view of a linked account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccountResponse {
    pub first_name: String,
    pub last_name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub own_team_id: i64,
}

impl From<&Credential> for AccountResponse {
    fn from(credential: &Credential) -> Self {
        Self {
            first_name: credential.first_name.clone(),
            last_name: credential.last_name.clone(),
            user_id: credential.user_id,
            own_team_id: credential.own_team_id,
        }
    }
}

/// All linked accounts.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountResponse>,
}

/// Body for linking a new account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
    /// Authorization code returned by the NK redirect
    pub code: String,
}

/// Body for renaming an account. The ID is a path parameter and cannot change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}
