//! Attach server error detail to response bodies outside production.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::config::RuntimeMode;
use crate::error::ErrorDetail;

// Error bodies are tiny; anything bigger is left as is.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Add a `details` field to 5xx JSON bodies that carry an [`ErrorDetail`].
pub async fn expose_error_details(
    State(mode): State<RuntimeMode>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    if mode.is_production() {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let mut value: serde_json::Value =
        serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(object) = value.as_object_mut() {
        object.insert("details".to_string(), serde_json::Value::String(detail));
    }

    let body = match serde_json::to_vec(&value) {
        Ok(body) => body,
        Err(_) => bytes.to_vec(),
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}
