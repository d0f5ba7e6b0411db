// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NK OAuth token endpoint client.
//!
//! Handles:
//! - Authorization code exchange (account linking)
//! - Refresh token exchange (expired access tokens)
//!
//! Both calls are a single POST with HTTP Basic client authentication and a
//! form body. Nothing is retried.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;

/// Token set returned by a successful exchange.
#[derive(Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: i64,
    pub own_team_id: i64,
    /// Lifetime of `access_token` in seconds
    pub expires_in: i64,
    /// When the response was received
    pub issued_at: DateTime<Utc>,
}

impl TokenGrant {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.expires_in)
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("user_id", &self.user_id)
            .field("own_team_id", &self.own_team_id)
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

/// Token response body from NK.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[allow(dead_code)]
    token_type: String,
    #[allow(dead_code)]
    scope: String,
    user_id: i64,
    own_team_id: i64,
    #[allow(dead_code)]
    jti: String,
    expires_in: i64,
}

/// Exchange of codes and refresh tokens for access tokens.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant, AppError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AppError>;
}

/// HTTP client for `POST {oauth_base}/token`.
#[derive(Clone)]
pub struct NkOAuthClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl NkOAuthClient {
    pub fn new(oauth_base_url: &str, client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: format!("{}/token", oauth_base_url.trim_end_matches('/')),
            client_id,
            client_secret,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.nk_oauth_url,
            config.nk_client_id.clone(),
            config.nk_client_secret.clone(),
        )
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> Result<TokenGrant, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::NkApi(format!("Token request failed: {}", e)))?;

        let issued_at = Utc::now();
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 400 || status.as_u16() == 401 {
                tracing::warn!(status = status.as_u16(), "NK rejected token request");
                return Err(AppError::UpstreamAuth(body));
            }
            return Err(AppError::NkApi(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::NkApi(format!("Token response parse error: {}", e)))?;

        Ok(TokenGrant {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.user_id,
            own_team_id: token.own_team_id,
            expires_in: token.expires_in,
            issued_at,
        })
    }
}

#[async_trait]
impl TokenExchange for NkOAuthClient {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant, AppError> {
        self.post_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AppError> {
        self.post_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}
