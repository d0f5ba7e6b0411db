// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-through access to an account's NK sessions, strokes and devices.
//!
//! Every request resolves the account's access token first, then fetches from
//! NK and reshapes the result. Nothing is cached.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::nk::NkSession;
use crate::models::{
    Device, DevicesResponse, Session, SessionsResponse, Stroke, StrokesResponse,
};
use crate::services::session_filter::{apply_filters, SessionFilterQuery};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/nk-accounts/{accountId}/data/sessions", get(list_sessions))
        .route(
            "/nk-accounts/{accountId}/data/sessions/{sessionId}",
            get(get_session),
        )
        .route(
            "/nk-accounts/{accountId}/data/sessions/{sessionId}/strokes",
            get(list_strokes),
        )
        .route(
            "/nk-accounts/{accountId}/data/sessions/{sessionId}/strokes/{strokeId}",
            get(get_stroke),
        )
        .route("/nk-accounts/{accountId}/data/devices", get(list_devices))
        .route(
            "/nk-accounts/{accountId}/data/devices/{deviceId}",
            get(get_device),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountPath {
    account_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionPath {
    account_id: i64,
    session_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrokePath {
    account_id: i64,
    session_id: i64,
    stroke_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevicePath {
    account_id: i64,
    device_id: i64,
}

// ─── Sessions ────────────────────────────────────────────────

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<AccountPath>, PathRejection>,
    query: std::result::Result<Query<SessionFilterQuery>, QueryRejection>,
) -> Result<Json<SessionsResponse>> {
    let Path(AccountPath { account_id }) = path?;
    let Query(filters) = query?;

    let token = state.resolver.resolve(account_id).await?;
    let sessions: Vec<Session> = state
        .nk_api
        .fetch_sessions(&token, filters.before, filters.after)
        .await?
        .iter()
        .map(Session::from_nk)
        .collect();

    let fetched = sessions.len();
    let sessions = apply_filters(sessions, &filters.predicates());
    tracing::debug!(account_id, fetched, kept = sessions.len(), "Filtered sessions");

    Ok(Json(SessionsResponse { sessions }))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<SessionPath>, PathRejection>,
) -> Result<Json<Session>> {
    let Path(SessionPath {
        account_id,
        session_id,
    }) = path?;

    let token = state.resolver.resolve(account_id).await?;
    let session = find_session(&state, &token, session_id).await?;

    Ok(Json(Session::from_nk(&session)))
}

/// Fetch the account's sessions and pick one out by ID.
async fn find_session(state: &AppState, token: &str, session_id: i64) -> Result<NkSession> {
    state
        .nk_api
        .fetch_sessions(token, None, None)
        .await?
        .into_iter()
        .find(|s| s.id == session_id)
        .ok_or_else(|| AppError::not_found("sessionId"))
}

// ─── Strokes ─────────────────────────────────────────────────

async fn session_strokes(state: &AppState, account_id: i64, session_id: i64) -> Result<Vec<Stroke>> {
    let token = state.resolver.resolve(account_id).await?;
    let session = find_session(state, &token, session_id).await?;

    let mut by_session = state.nk_api.fetch_strokes(&token, &[session_id]).await?;
    let strokes = by_session
        .remove(&session_id)
        .unwrap_or_default()
        .iter()
        .map(|s| Stroke::from_nk(s, session.speed_input))
        .collect();

    Ok(strokes)
}

async fn list_strokes(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<SessionPath>, PathRejection>,
) -> Result<Json<StrokesResponse>> {
    let Path(SessionPath {
        account_id,
        session_id,
    }) = path?;

    let strokes = session_strokes(&state, account_id, session_id).await?;
    Ok(Json(StrokesResponse { strokes }))
}

async fn get_stroke(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<StrokePath>, PathRejection>,
) -> Result<Json<Stroke>> {
    let Path(StrokePath {
        account_id,
        session_id,
        stroke_id,
    }) = path?;

    let stroke = session_strokes(&state, account_id, session_id)
        .await?
        .into_iter()
        .find(|s| s.id == stroke_id)
        .ok_or_else(|| AppError::not_found("strokeId"))?;

    Ok(Json(stroke))
}

// ─── Devices ─────────────────────────────────────────────────

async fn list_devices(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<AccountPath>, PathRejection>,
) -> Result<Json<DevicesResponse>> {
    let Path(AccountPath { account_id }) = path?;

    let token = state.resolver.resolve(account_id).await?;
    let devices = state
        .nk_api
        .fetch_devices(&token)
        .await?
        .iter()
        .map(Device::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(DevicesResponse { devices }))
}

async fn get_device(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<DevicePath>, PathRejection>,
) -> Result<Json<Device>> {
    let Path(DevicePath {
        account_id,
        device_id,
    }) = path?;

    let token = state.resolver.resolve(account_id).await?;
    let device = state
        .nk_api
        .fetch_device(&token, device_id)
        .await?
        .ok_or_else(|| AppError::not_found("deviceId"))?;

    Ok(Json(Device::try_from(&device)?))
}
