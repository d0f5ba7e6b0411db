// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Linked NK account CRUD.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    AccountResponse, AccountsResponse, CreateAccountRequest, Credential, UpdateAccountRequest,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/nk-accounts", get(list_accounts).post(create_account))
        .route(
            "/nk-accounts/{id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
}

/// Link a new account from an NK authorization code.
async fn create_account(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<Json<AccountResponse>> {
    let Json(request) = body?;

    let grant = state
        .oauth
        .exchange_code(&request.code, &state.config.nk_redirect_uri)
        .await
        .map_err(|e| match e {
            AppError::UpstreamAuth(detail) => {
                tracing::warn!(detail = %detail, "NK rejected authorization code");
                AppError::UpstreamAuth("Invalid authorization code".to_string())
            }
            other => other,
        })?;

    let credential = Credential {
        user_id: grant.user_id,
        own_team_id: grant.own_team_id,
        first_name: request.first_name,
        last_name: request.last_name,
        token_expiry: grant.expires_at(),
        access_token: grant.access_token,
        refresh_token: grant.refresh_token,
    };

    state.store.create_credential(&credential).await?;

    tracing::info!(user_id = credential.user_id, "Linked NK account");
    Ok(Json(AccountResponse::from(&credential)))
}

async fn list_accounts(State(state): State<Arc<AppState>>) -> Result<Json<AccountsResponse>> {
    let accounts = state
        .store
        .list_credentials()
        .await?
        .iter()
        .map(AccountResponse::from)
        .collect();

    Ok(Json(AccountsResponse { accounts }))
}

async fn get_account(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<AccountResponse>> {
    let Path(id) = path?;

    let credential = state
        .store
        .find_credential(id)
        .await?
        .ok_or_else(|| AppError::not_found("id"))?;

    Ok(Json(AccountResponse::from(&credential)))
}

/// Rename an account. Tokens and IDs are not editable.
async fn update_account(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<AccountResponse>> {
    let Path(id) = path?;
    let Json(request) = body?;

    let credential = state
        .store
        .rename_credential(id, &request.first_name, &request.last_name)
        .await?
        .ok_or_else(|| AppError::not_found("id"))?;

    Ok(Json(AccountResponse::from(&credential)))
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = path?;

    if !state.store.delete_credential(id).await? {
        return Err(AppError::not_found("id"));
    }

    tracing::info!(user_id = id, "Unlinked NK account");
    Ok(StatusCode::NO_CONTENT)
}
