// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Client errors carry `{ "message": ... }` bodies, missing entities carry
//! `{ "key": ... }` naming the parameter that did not resolve. Server errors
//! only expose a generic message; the underlying detail travels as an
//! [`ErrorDetail`] response extension so that non-production builds can
//! surface it (see `middleware::error_details`).

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {key}")]
    NotFound { key: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The vendor rejected an authorization code or refresh token.
    #[error("NK authorization rejected: {0}")]
    UpstreamAuth(String),

    #[error("NK API error: {0}")]
    NkApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a 404 keyed by the path parameter that did not resolve.
    pub fn not_found(key: &str) -> Self {
        AppError::NotFound {
            key: key.to_string(),
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::UpstreamAuth(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NkApi(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        AppError::BadRequest("Invalid request body".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameters");
        AppError::BadRequest("Invalid path parameter (IDs must be integers)".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}

/// `{ "message": ... }` body used for 4xx/5xx responses.
#[derive(Serialize)]
pub struct MessageBody {
    pub message: String,
}

/// `{ "key": ... }` body used for 404 responses.
#[derive(Serialize)]
struct KeyBody {
    key: String,
}

/// Detail of a server-side failure, attached to 5xx responses as an extension.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            AppError::NotFound { key } => (status, Json(KeyBody { key })).into_response(),
            AppError::BadRequest(message)
            | AppError::Conflict(message)
            | AppError::UpstreamAuth(message) => (status, Json(MessageBody { message })).into_response(),
            AppError::RateLimited => (
                status,
                Json(MessageBody {
                    message: "Too many requests".to_string(),
                }),
            )
                .into_response(),
            AppError::NkApi(msg) => {
                tracing::error!(error = %msg, "NK API error");
                server_error("Upstream NK request failed", msg)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                server_error("Database error", msg)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                server_error("Internal server error", format!("{:?}", err))
            }
        }
    }
}

fn server_error(message: &str, detail: String) -> Response {
    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageBody {
            message: message.to_string(),
        }),
    )
        .into_response();
    response.extensions_mut().insert(ErrorDetail(detail));
    response
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_uses_key_body() {
        let response = AppError::not_found("sessionId").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "key": "sessionId" })
        );
    }

    #[tokio::test]
    async fn test_conflict_uses_message_body() {
        let response = AppError::Conflict("User already exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "User already exists" })
        );
    }

    #[tokio::test]
    async fn test_upstream_auth_is_bad_request() {
        let response = AppError::UpstreamAuth("invalid_grant".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_server_errors_hide_detail_in_body() {
        let response = AppError::Database("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().cloned().unwrap();
        assert_eq!(detail.0, "connection refused");

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "message": "Database error" }));
    }
}
