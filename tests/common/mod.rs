// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use nk_dashboard::config::Config;
use nk_dashboard::db::{CredentialStore, InMemoryCredentialStore};
use nk_dashboard::models::Credential;
use nk_dashboard::routes::create_router;
use nk_dashboard::services::TokenExchange;
use nk_dashboard::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

/// Postgres URL for store tests, if one is configured.
#[allow(dead_code)]
pub fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Skip test with message if no test database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        match crate::common::database_url() {
            Some(url) => url,
            None => {
                eprintln!("⚠️  Skipping: TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}

/// Test config with a rate limit high enough not to interfere.
#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        rate_limit_per_second: 10_000,
        ..Config::test_default()
    }
}

/// Test config with the NK endpoints served by `server`.
#[allow(dead_code)]
pub fn test_config_for(server: &MockServer) -> Config {
    Config {
        nk_oauth_url: format!("{}/oauth", server.uri()),
        nk_api_url: format!("{}/api/v1", server.uri()),
        ..test_config()
    }
}

#[allow(dead_code)]
pub fn create_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
    let state = Arc::new(AppState::new(config, store));
    (create_router(state.clone()), state)
}

/// Create a test app whose token exchange is `exchange` instead of HTTP.
#[allow(dead_code)]
pub fn create_app_with_exchange(
    exchange: Arc<dyn TokenExchange>,
) -> (axum::Router, Arc<AppState>) {
    let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
    let state = Arc::new(AppState::with_token_exchange(test_config(), store, exchange));
    (create_router(state.clone()), state)
}

/// Create a test app with an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_app_with_config(test_config())
}

/// Create a test app whose NK calls go to `server`.
#[allow(dead_code)]
pub fn create_test_app_with_nk(server: &MockServer) -> (axum::Router, Arc<AppState>) {
    create_app_with_config(test_config_for(server))
}

#[allow(dead_code)]
pub fn credential(user_id: i64, access_token: &str, token_expiry: DateTime<Utc>) -> Credential {
    Credential {
        user_id,
        own_team_id: 900,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        access_token: access_token.to_string(),
        refresh_token: format!("refresh-for-{}", user_id),
        token_expiry,
    }
}

/// Store a credential whose access token is valid for another hour.
#[allow(dead_code)]
pub async fn seed_account(state: &AppState, user_id: i64, access_token: &str) {
    state
        .store
        .upsert_credential(&credential(
            user_id,
            access_token,
            Utc::now() + chrono::Duration::hours(1),
        ))
        .await
        .unwrap();
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ─── NK payload fixtures ─────────────────────────────────────

#[allow(dead_code)]
pub fn nk_token_json(user_id: i64, access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": format!("{}-refresh", access_token),
        "token_type": "bearer",
        "scope": "read",
        "user_id": user_id,
        "own_team_id": 900,
        "jti": "jti-1",
        "expires_in": 3600
    })
}

/// A GPS "just go" session lasting `elapsed_ms`.
#[allow(dead_code)]
pub fn nk_session_json(id: i64, elapsed_ms: f64) -> Value {
    json!({
        "id": id,
        "name": format!("Row {}", id),
        "type": 0,
        "speedInput": 0,
        "startTime": 1_704_103_200_000i64 + id * 86_400_000,
        "endTime": 1_704_103_200_000i64 + id * 86_400_000 + elapsed_ms as i64,
        "elapsedTime": elapsed_ms,
        "totalDistanceGps": elapsed_ms * 4.0 / 1000.0,
        "totalDistanceImp": elapsed_ms * 3.9 / 1000.0,
        "avgPaceGps": 125_000.0,
        "avgPaceImp": 128_000.0,
        "avgStrokeRate": 22.5,
        "distStrokeGps": 10.2,
        "distStrokeImp": 9.8,
        "avgSpeedGps": 4.0,
        "avgSpeedImp": 3.9,
        "totalStrokeCount": (elapsed_ms / 2600.0) as i64,
        "startGpsLat": 47.65,
        "startGpsLon": -122.3,
        "avgHeartRate": 0.0,
        "location": "Lake Union",
        "deviceId": 31,
        "intervals": [],
        "oarlockSessions": []
    })
}

#[allow(dead_code)]
pub fn nk_stroke_json(id: i64, session_id: i64) -> Value {
    json!({
        "id": id,
        "timestamp": 1_704_103_200_000i64 + id * 1000,
        "sessionId": session_id,
        "sessionIntervalId": 1,
        "elapsedTime": (id * 1000) as f64,
        "latitude": 47.65,
        "longitude": -122.3,
        "gpsInstaSpeed": 4.1,
        "impellerInstaSpeed": 3.8,
        "gpsTotalDistance": (id * 10) as f64,
        "impellerTotalDistance": (id * 9) as f64,
        "gpsDistStroke": 10.0,
        "impellerDistStroke": 9.0,
        "strokeCount": id,
        "strokeRate": 24.0,
        "heartRate": null
    })
}

#[allow(dead_code)]
pub fn nk_device_json(id: i64, kind: u8) -> Value {
    json!({
        "id": id,
        "type": kind,
        "model": "SpeedCoach GPS 2",
        "name": format!("Device {}", id),
        "firmwareVersion": "2.13",
        "hardwareVersion": "C",
        "serialNumber": 4_200_000 + id,
        "manufacturerName": "NK Sports",
        "profileVersion": "5",
        "inboardLength": null,
        "oarLength": null,
        "portStarboard": null,
        "seatNumber": null
    })
}
