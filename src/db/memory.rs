// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory credential store for tests and local demos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{duplicate_user, CredentialStore};
use crate::error::AppError;
use crate::models::Credential;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    rows: DashMap<i64, Credential>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_credential(&self, user_id: i64) -> Result<Option<Credential>, AppError> {
        Ok(self.rows.get(&user_id).map(|row| row.value().clone()))
    }

    async fn list_credentials(&self) -> Result<Vec<Credential>, AppError> {
        let mut all: Vec<Credential> = self.rows.iter().map(|row| row.value().clone()).collect();
        all.sort_by_key(|c| c.user_id);
        Ok(all)
    }

    async fn create_credential(&self, credential: &Credential) -> Result<(), AppError> {
        match self.rows.entry(credential.user_id) {
            Entry::Occupied(_) => Err(duplicate_user(credential.user_id)),
            Entry::Vacant(slot) => {
                slot.insert(credential.clone());
                Ok(())
            }
        }
    }

    async fn upsert_credential(&self, credential: &Credential) -> Result<(), AppError> {
        self.rows.insert(credential.user_id, credential.clone());
        Ok(())
    }

    async fn update_tokens(
        &self,
        user_id: i64,
        access_token: &str,
        refresh_token: &str,
        token_expiry: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(match self.rows.get_mut(&user_id) {
            Some(mut row) => {
                row.access_token = access_token.to_string();
                row.refresh_token = refresh_token.to_string();
                row.token_expiry = token_expiry;
                true
            }
            None => false,
        })
    }

    async fn rename_credential(
        &self,
        user_id: i64,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Credential>, AppError> {
        Ok(self.rows.get_mut(&user_id).map(|mut row| {
            row.first_name = first_name.to_string();
            row.last_name = last_name.to_string();
            row.clone()
        }))
    }

    async fn delete_credential(&self, user_id: i64) -> Result<bool, AppError> {
        Ok(self.rows.remove(&user_id).is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
