// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NK Logbook API client.
//!
//! Thin bearer-token GETs against the vendor API. Responses are decoded into
//! the schemas in [`crate::models::nk`]; anything that does not match is an
//! error. No pagination, no retries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::models::nk::{NkDevice, NkSession, NkStroke};
use crate::time_utils::to_epoch_millis;

/// NK Logbook API client.
#[derive(Clone)]
pub struct NkApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl NkApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.nk_api_url)
    }

    /// List sessions, optionally limited to a time window (inclusive bounds).
    pub async fn fetch_sessions(
        &self,
        access_token: &str,
        before: Option<DateTime<Utc>>,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<NkSession>, AppError> {
        let mut query = Vec::new();
        if let Some(before) = before {
            query.push(("before", to_epoch_millis(before).to_string()));
        }
        if let Some(after) = after {
            query.push(("after", to_epoch_millis(after).to_string()));
        }

        let url = format!("{}/sessions", self.base_url);
        self.get_json(&url, access_token, &query).await
    }

    /// Strokes for several sessions in one request, keyed by session ID.
    ///
    /// Sessions without strokes may be absent from the map.
    pub async fn fetch_strokes(
        &self,
        access_token: &str,
        session_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<NkStroke>>, AppError> {
        if session_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = session_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let url = format!("{}/sessions/strokes", self.base_url);
        self.get_json(&url, access_token, &[("sessionIds", ids)])
            .await
    }

    pub async fn fetch_devices(&self, access_token: &str) -> Result<Vec<NkDevice>, AppError> {
        let url = format!("{}/devices", self.base_url);
        self.get_json(&url, access_token, &[]).await
    }

    /// Fetch one device. NK answering 404 means the device does not exist.
    pub async fn fetch_device(
        &self,
        access_token: &str,
        device_id: i64,
    ) -> Result<Option<NkDevice>, AppError> {
        let url = format!("{}/devices/{}", self.base_url, device_id);
        let response = self.send_get(&url, access_token, &[]).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.check_response_json(response).await.map(Some)
    }

    async fn send_get(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, AppError> {
        tracing::debug!(url, "NK API request");
        self.http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::NkApi(e.to_string()))
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self.send_get(url, access_token, query).await?;
        self.check_response_json(response).await
    }

    /// Check response status and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                tracing::warn!("NK API rejected access token (401)");
            }

            return Err(AppError::NkApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::NkApi(format!("JSON parse error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::from_epoch_millis;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn stroke(id: i64, session_id: i64) -> serde_json::Value {
        json!({
            "id": id, "timestamp": 1_700_000_000_000i64 + id, "sessionId": session_id,
            "sessionIntervalId": 1, "elapsedTime": 1000.0, "latitude": 1.0, "longitude": 2.0,
            "gpsInstaSpeed": 4.0, "impellerInstaSpeed": 3.9, "gpsTotalDistance": 10.0,
            "impellerTotalDistance": 9.5, "gpsDistStroke": 8.0, "impellerDistStroke": 7.9,
            "strokeCount": id, "strokeRate": 20.0, "heartRate": null
        })
    }

    #[tokio::test]
    async fn test_fetch_sessions_forwards_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param("before", "1700000600000"))
            .and(query_param("after", "1700000000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let sessions = NkApiClient::new(&server.uri())
            .fetch_sessions(
                "tok",
                from_epoch_millis(1_700_000_600_000),
                from_epoch_millis(1_700_000_000_000),
            )
            .await
            .unwrap();
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_strokes_single_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/strokes"))
            .and(query_param("sessionIds", "1,2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "1": [stroke(10, 1), stroke(11, 1)],
                "2": [stroke(20, 2)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let strokes = NkApiClient::new(&server.uri())
            .fetch_strokes("tok", &[1, 2])
            .await
            .unwrap();
        assert_eq!(strokes[&1].len(), 2);
        assert_eq!(strokes[&2][0].id, 20);
    }

    #[tokio::test]
    async fn test_fetch_strokes_empty_ids_skips_request() {
        // No mock mounted: any request would fail.
        let server = MockServer::start().await;
        let strokes = NkApiClient::new(&server.uri())
            .fetch_strokes("tok", &[])
            .await
            .unwrap();
        assert!(strokes.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_device_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devices/5"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let device = NkApiClient::new(&server.uri())
            .fetch_device("tok", 5)
            .await
            .unwrap();
        assert!(device.is_none());
    }

    #[tokio::test]
    async fn test_invalid_payload_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "not-a-number"}])))
            .mount(&server)
            .await;

        let err = NkApiClient::new(&server.uri())
            .fetch_devices("tok")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NkApi(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_timestamp_is_error() {
        let server = MockServer::start().await;
        let mut bad = stroke(10, 1);
        bad["timestamp"] = json!(i64::MAX);
        Mock::given(method("GET"))
            .and(path("/sessions/strokes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "1": [bad] })))
            .mount(&server)
            .await;

        let err = NkApiClient::new(&server.uri())
            .fetch_strokes("tok", &[1])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NkApi(_)));
    }

    #[tokio::test]
    async fn test_vendor_outage_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = NkApiClient::new(&server.uri())
            .fetch_sessions("tok", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NkApi(_)));
    }
}
