//! Credential storage.
//!
//! Handlers and the token resolver only see the [`CredentialStore`] trait.
//! Production uses Postgres; tests and local demos use the in-memory map.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::Credential;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Database URL that selects [`InMemoryCredentialStore`].
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Repository of linked NK credentials, keyed by NK user ID.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential(&self, user_id: i64) -> Result<Option<Credential>, AppError>;

    /// All stored credentials, ordered by user ID.
    async fn list_credentials(&self) -> Result<Vec<Credential>, AppError>;

    /// Insert a new credential. Fails with `Conflict` if the user already has one,
    /// in which case the stored row is left untouched.
    async fn create_credential(&self, credential: &Credential) -> Result<(), AppError>;

    /// Insert or overwrite. Last write wins.
    async fn upsert_credential(&self, credential: &Credential) -> Result<(), AppError>;

    /// Replace only the token columns. Returns whether the row still exists;
    /// a credential deleted meanwhile stays deleted.
    async fn update_tokens(
        &self,
        user_id: i64,
        access_token: &str,
        refresh_token: &str,
        token_expiry: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Change the display name. Returns `None` if the user has no credential.
    async fn rename_credential(
        &self,
        user_id: i64,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Credential>, AppError>;

    /// Returns whether a row was deleted.
    async fn delete_credential(&self, user_id: i64) -> Result<bool, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

/// Open the store named by `database_url`.
pub async fn connect(database_url: &str) -> Result<Arc<dyn CredentialStore>, AppError> {
    if database_url == MEMORY_DATABASE_URL {
        tracing::warn!("Using in-memory credential store; linked accounts will not persist");
        return Ok(Arc::new(InMemoryCredentialStore::new()));
    }

    let store = PgCredentialStore::connect(database_url).await?;
    store.ensure_schema().await?;
    Ok(Arc::new(store))
}

pub(crate) fn duplicate_user(user_id: i64) -> AppError {
    AppError::Conflict(format!("User {} already exists", user_id))
}
