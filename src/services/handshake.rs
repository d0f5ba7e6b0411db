// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth redirect handshake with NK.
//!
//! A login attempt stores the caller's state under a random ID for one minute
//! and sends the user to NK's authorize page with that ID as the OAuth
//! `state`. When NK redirects back, the entry is looked up and removed
//! whatever the outcome, so each ID can be used at most once.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

/// How long a login attempt stays valid.
pub const LOGIN_TTL_MS: i64 = 60 * 1000;

/// String key/value storage holding pending login attempts.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str) -> Option<String>;
    fn keys(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

/// Caller state plus expiry, as stored under the attempt ID.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StoredLogin {
    state: BTreeMap<String, String>,
    /// ms since epoch
    expires_on: i64,
}

/// A started login attempt.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub id: String,
    pub authorize_url: String,
}

/// A completed login: the caller's state and NK's authorization code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumedLogin {
    pub state: BTreeMap<String, String>,
    pub code: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    #[error("Redirect missing code/state")]
    MissingParams,

    #[error("No pending login for this state")]
    MissingState,

    #[error("Stored login state is malformed")]
    Invalid,

    #[error("Login attempt expired")]
    Expired,
}

impl From<HandshakeError> for AppError {
    fn from(err: HandshakeError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

pub struct RedirectHandshake<S: KeyValueStorage> {
    storage: S,
    authorize_url: String,
    client_id: String,
    redirect_uri: String,
    rng: SystemRandom,
}

impl<S: KeyValueStorage> RedirectHandshake<S> {
    pub fn new(storage: S, oauth_base_url: &str, client_id: String, redirect_uri: String) -> Self {
        Self {
            storage,
            authorize_url: format!("{}/authorize", oauth_base_url.trim_end_matches('/')),
            client_id,
            redirect_uri,
            rng: SystemRandom::new(),
        }
    }

    pub fn from_config(storage: S, config: &Config) -> Self {
        Self::new(
            storage,
            &config.nk_oauth_url,
            config.nk_client_id.clone(),
            config.nk_redirect_uri.clone(),
        )
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn begin_login(&self, state: BTreeMap<String, String>) -> Result<LoginRedirect, AppError> {
        self.begin_login_at(state, Utc::now().timestamp_millis())
    }

    /// Store `state` under a fresh ID and build NK's authorize URL.
    ///
    /// Expired attempts are swept first, so abandoned logins do not pile up.
    pub fn begin_login_at(
        &self,
        state: BTreeMap<String, String>,
        now_ms: i64,
    ) -> Result<LoginRedirect, AppError> {
        self.sweep_expired_at(now_ms);

        let id = self.random_id()?;
        let stored = StoredLogin {
            state,
            expires_on: now_ms + LOGIN_TTL_MS,
        };
        let json = serde_json::to_string(&stored)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to store login: {}", e)))?;
        self.storage.set(&id, json);

        let authorize_url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope=read&state={}",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            id
        );

        tracing::debug!(id = %id, "Login attempt started");
        Ok(LoginRedirect { id, authorize_url })
    }

    pub fn complete_login(
        &self,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<ConsumedLogin, HandshakeError> {
        self.complete_login_at(code, state, Utc::now().timestamp_millis())
    }

    /// Consume the attempt named by `state`.
    pub fn complete_login_at(
        &self,
        code: Option<&str>,
        state: Option<&str>,
        now_ms: i64,
    ) -> Result<ConsumedLogin, HandshakeError> {
        let (Some(code), Some(id)) = (code, state) else {
            self.sweep_expired_at(now_ms);
            return Err(HandshakeError::MissingParams);
        };

        let raw = self.storage.remove(id);
        self.sweep_expired_at(now_ms);

        let raw = raw.ok_or(HandshakeError::MissingState)?;
        let stored: StoredLogin =
            serde_json::from_str(&raw).map_err(|_| HandshakeError::Invalid)?;

        if stored.expires_on < now_ms {
            return Err(HandshakeError::Expired);
        }

        Ok(ConsumedLogin {
            state: stored.state,
            code: code.to_string(),
        })
    }

    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now().timestamp_millis())
    }

    /// Remove expired login attempts. Entries that are not login attempts are
    /// left alone. Returns how many were removed.
    pub fn sweep_expired_at(&self, now_ms: i64) -> usize {
        let mut removed = 0;
        for key in self.storage.keys() {
            let Some(raw) = self.storage.get(&key) else {
                continue;
            };
            let Ok(stored) = serde_json::from_str::<StoredLogin>(&raw) else {
                continue;
            };
            if stored.expires_on < now_ms && self.storage.remove(&key).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "Swept expired login attempts");
        }
        removed
    }

    fn random_id(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; 12];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Random number generation failed")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn handshake() -> RedirectHandshake<MemoryStorage> {
        RedirectHandshake::new(
            MemoryStorage::new(),
            "https://oauth.example.com/oauth",
            "client".to_string(),
            "http://localhost:5173/nk-auth-redirect".to_string(),
        )
    }

    fn caller_state() -> BTreeMap<String, String> {
        BTreeMap::from([("returnTo".to_string(), "/sessions".to_string())])
    }

    #[test]
    fn test_authorize_url() {
        let hs = handshake();
        let login = hs.begin_login_at(caller_state(), NOW).unwrap();

        assert_eq!(login.id.len(), 16);
        assert!(login
            .authorize_url
            .starts_with("https://oauth.example.com/oauth/authorize?response_type=code"));
        assert!(login.authorize_url.contains("client_id=client"));
        assert!(login
            .authorize_url
            .contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173%2Fnk-auth-redirect"));
        assert!(login.authorize_url.contains("scope=read"));
        assert!(login.authorize_url.ends_with(&format!("state={}", login.id)));
    }

    #[test]
    fn test_login_is_single_use() {
        let hs = handshake();
        let login = hs.begin_login_at(caller_state(), NOW).unwrap();

        let consumed = hs
            .complete_login_at(Some("the-code"), Some(&login.id), NOW + 1000)
            .unwrap();
        assert_eq!(consumed.code, "the-code");
        assert_eq!(consumed.state, caller_state());

        let again = hs.complete_login_at(Some("the-code"), Some(&login.id), NOW + 2000);
        assert_eq!(again, Err(HandshakeError::MissingState));
    }

    #[test]
    fn test_expired_login_fails_and_is_removed() {
        let hs = handshake();
        let login = hs.begin_login_at(caller_state(), NOW).unwrap();

        let result = hs.complete_login_at(Some("c"), Some(&login.id), NOW + LOGIN_TTL_MS + 1);
        assert_eq!(result, Err(HandshakeError::Expired));
        assert!(hs.storage().is_empty());
    }

    #[test]
    fn test_missing_params() {
        let hs = handshake();
        assert_eq!(
            hs.complete_login_at(None, Some("x"), NOW),
            Err(HandshakeError::MissingParams)
        );
        assert_eq!(
            hs.complete_login_at(Some("c"), None, NOW),
            Err(HandshakeError::MissingParams)
        );
    }

    #[test]
    fn test_malformed_entry_is_invalid() {
        let hs = handshake();
        hs.storage().set("bogus", "{not json".to_string());
        assert_eq!(
            hs.complete_login_at(Some("c"), Some("bogus"), NOW),
            Err(HandshakeError::Invalid)
        );
        assert!(hs.storage().get("bogus").is_none());
    }

    #[test]
    fn test_sweep_only_touches_expired_logins() {
        let hs = handshake();
        let old = hs.begin_login_at(caller_state(), NOW).unwrap();
        let fresh = hs
            .begin_login_at(caller_state(), NOW + LOGIN_TTL_MS)
            .unwrap();
        hs.storage().set("theme", "\"dark\"".to_string());
        hs.storage()
            .set("other", r#"{"expiresOn": 0, "extra": true}"#.to_string());

        let removed = hs.sweep_expired_at(NOW + LOGIN_TTL_MS + 1);
        assert_eq!(removed, 1);
        assert!(hs.storage().get(&old.id).is_none());
        assert!(hs.storage().get(&fresh.id).is_some());
        assert!(hs.storage().get("theme").is_some());
        assert!(hs.storage().get("other").is_some());
    }

    #[test]
    fn test_completion_sweeps_abandoned_attempts() {
        let hs = handshake();
        let abandoned = hs.begin_login_at(caller_state(), NOW).unwrap();
        let current = hs
            .begin_login_at(caller_state(), NOW + LOGIN_TTL_MS)
            .unwrap();

        hs.complete_login_at(Some("c"), Some(&current.id), NOW + LOGIN_TTL_MS + 1)
            .unwrap();
        assert!(hs.storage().get(&abandoned.id).is_none());
        assert_eq!(hs.storage().len(), 0);
    }

    #[test]
    fn test_abandoned_logins_do_not_accumulate() {
        let hs = handshake();
        for minute in 0..10 {
            hs.begin_login_at(caller_state(), NOW + minute * (LOGIN_TTL_MS + 1))
                .unwrap();
            assert_eq!(hs.storage().len(), 1);
        }

        // Attempts still inside their window are kept.
        hs.begin_login_at(caller_state(), NOW + 9 * (LOGIN_TTL_MS + 1) + 10)
            .unwrap();
        assert_eq!(hs.storage().len(), 2);
    }
}
