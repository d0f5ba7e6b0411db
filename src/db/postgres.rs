// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres credential store.
//!
//! One table, `nk_credential`, keyed by NK user ID. There is no migration
//! logic: [`PgCredentialStore::ensure_schema`] only creates the table when it
//! is missing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{duplicate_user, CredentialStore};
use crate::error::AppError;
use crate::models::Credential;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS nk_credential (
        user_id BIGINT PRIMARY KEY,
        own_team_id BIGINT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        access_token TEXT NOT NULL,
        refresh_token TEXT NOT NULL,
        token_expiry TIMESTAMPTZ NOT NULL
    )
"#;

const COLUMNS: &str =
    "user_id, own_team_id, first_name, last_name, access_token, refresh_token, token_expiry";

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Postgres: {}", e)))?;

        tracing::info!("Database pool initialized");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the credential table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_credential(&self, user_id: i64) -> Result<Option<Credential>, AppError> {
        let row = sqlx::query_as::<_, Credential>(&format!(
            "SELECT {} FROM nk_credential WHERE user_id = $1",
            COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_credentials(&self) -> Result<Vec<Credential>, AppError> {
        let rows = sqlx::query_as::<_, Credential>(&format!(
            "SELECT {} FROM nk_credential ORDER BY user_id",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create_credential(&self, credential: &Credential) -> Result<(), AppError> {
        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO nk_credential ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO NOTHING
            "#,
            COLUMNS
        ))
        .bind(credential.user_id)
        .bind(credential.own_team_id)
        .bind(&credential.first_name)
        .bind(&credential.last_name)
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.token_expiry)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(duplicate_user(credential.user_id));
        }
        Ok(())
    }

    async fn upsert_credential(&self, credential: &Credential) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO nk_credential ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                own_team_id = EXCLUDED.own_team_id,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                token_expiry = EXCLUDED.token_expiry
            "#,
            COLUMNS
        ))
        .bind(credential.user_id)
        .bind(credential.own_team_id)
        .bind(&credential.first_name)
        .bind(&credential.last_name)
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.token_expiry)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_tokens(
        &self,
        user_id: i64,
        access_token: &str,
        refresh_token: &str,
        token_expiry: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE nk_credential
            SET access_token = $2, refresh_token = $3, token_expiry = $4
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expiry)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rename_credential(
        &self,
        user_id: i64,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Credential>, AppError> {
        let row = sqlx::query_as::<_, Credential>(&format!(
            r#"
            UPDATE nk_credential
            SET first_name = $2, last_name = $3
            WHERE user_id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_credential(&self, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM nk_credential WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
