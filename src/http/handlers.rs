//! Inbound request handlers.
//!
//! # Responsibilities
//! - `/api/{*path}`: cache check, then drive the queue via the adapter
//! - `/health`: read-only introspection of queue and cache
//! - `/cache/clear`: development-mode maintenance

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::error::error_response;
use crate::http::server::AppState;
use crate::upstream::UpstreamClient;

/// Proxy one GET to the upstream, serving from cache when possible.
///
/// The cache key is exactly the upstream resource the adapter would call,
/// so a hit corresponds 1:1 to an identical upstream request.
pub async fn proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let resource = UpstreamClient::resource(&path, query.as_deref());

    if let Some(data) = state.cache.get(&resource).await {
        tracing::debug!(resource = %resource, "serving from cache");
        return (StatusCode::OK, Json(data)).into_response();
    }

    let client = state.upstream.clone();
    let call_path = path.clone();
    let call_query = query.clone();
    let result = state
        .queue
        .submit(move || {
            let client = client.clone();
            let path = call_path.clone();
            let query = call_query.clone();
            async move { client.call(&path, query.as_deref()).await }
        })
        .await;

    match result {
        Ok(response) => {
            if response.status == 200 {
                state.cache.put(resource, response.body.clone()).await;
            }
            let status =
                StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(response.body)).into_response()
        }
        Err(err) => {
            tracing::warn!(resource = %resource, error = %err, "proxied request failed");
            error_response(&err, state.development)
        }
    }
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub queue_depth: usize,
    pub cache_entries: usize,
    pub uptime_secs: u64,
}

/// Read-only operational introspection.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        queue_depth: state.queue.depth().await,
        cache_entries: state.cache.len().await,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Empty the response cache. Only routed in development mode.
pub async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.cache.clear().await;
    Json(serde_json::json!({ "cleared": true }))
}
