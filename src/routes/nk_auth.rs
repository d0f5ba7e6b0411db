// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NK OAuth redirect handshake routes.
//!
//! `/nk-auth/login` sends the browser to NK; NK redirects to the frontend,
//! which passes `code` and `state` to `/nk-auth/return` to get back the state
//! it started with. The code then goes to `POST /nk-accounts`.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::services::handshake::ConsumedLogin;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/nk-auth/login", get(login))
        .route("/nk-auth/return", get(login_return))
}

/// Start a login. All query parameters are kept as the caller's state.
async fn login(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<BTreeMap<String, String>>, QueryRejection>,
) -> Result<Redirect> {
    let Query(caller_state) = query?;

    let login = state.handshake.begin_login(caller_state)?;
    tracing::info!("Starting NK login, redirecting to NK");

    Ok(Redirect::temporary(&login.authorize_url))
}

#[derive(Deserialize)]
struct ReturnParams {
    code: Option<String>,
    state: Option<String>,
}

async fn login_return(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<ReturnParams>, QueryRejection>,
) -> Result<Json<ConsumedLogin>> {
    let Query(params) = query?;

    let consumed = state
        .handshake
        .complete_login(params.code.as_deref(), params.state.as_deref())
        .map_err(|e| {
            tracing::warn!(error = %e, "NK login return rejected");
            e
        })?;

    Ok(Json(consumed))
}
