//! User-facing error translation.
//!
//! The queue surfaces raw upstream errors unchanged; this is the single
//! place that turns them into a response. Underlying error detail is only
//! exposed in development mode.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::upstream::UpstreamError;

/// Map an upstream error to the response status and user-facing message.
fn classify(err: &UpstreamError) -> (StatusCode, &'static str) {
    match err {
        UpstreamError::Status { status: 404, .. } => (StatusCode::NOT_FOUND, "data not found"),
        UpstreamError::Status { status: 429, .. } => {
            (StatusCode::TOO_MANY_REQUESTS, "too many requests, please wait")
        }
        UpstreamError::Status { status: 403, .. } => {
            (StatusCode::FORBIDDEN, "access denied, check API key")
        }
        UpstreamError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "upstream request timed out"),
        UpstreamError::Connect(_) => (StatusCode::BAD_GATEWAY, "cannot reach upstream"),
        UpstreamError::Status { status, .. } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "upstream error",
        ),
        UpstreamError::Transport(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream error"),
    }
}

/// Build the error response for a failed proxied request.
pub fn error_response(err: &UpstreamError, development: bool) -> Response {
    let (status, message) = classify(err);
    let mut body = serde_json::json!({ "error": message });
    if development {
        let detail = match err {
            UpstreamError::Status { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        };
        body["detail"] = Value::String(detail);
    }
    (status, Json(body)).into_response()
}
