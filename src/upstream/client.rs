//! Upstream client adapter.
//!
//! # Responsibilities
//! - Build the fully qualified upstream URL from a local path + query
//! - Attach the static `x-api-key` credential header
//! - Enforce the per-request timeout
//! - Classify the outcome into [`UpstreamError`] variants
//!
//! Retry, caching and rate pacing are deliberately absent here; those belong
//! to the queue and the cache.

use std::time::Duration;

use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::upstream::error::UpstreamError;

/// Header carrying the upstream credential.
const API_KEY_HEADER: &str = "x-api-key";

/// One upstream completion carried back to the caller.
///
/// Statuses below 500 other than 429 are completions, not errors: the proxy
/// relays the upstream's own 4xx bodies (e.g. the API's `{"code": 404}`
/// payloads) verbatim. Only 429 and 5xx become [`UpstreamError`].
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

/// Thin client for the upstream stats API.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl UpstreamClient {
    /// Build a client from config. The timeout is baked into the inner
    /// `reqwest::Client` so every call inherits it.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// The upstream resource identifier for a path + raw query string.
    ///
    /// This doubles as the cache key: it is exactly the part of the upstream
    /// URL that varies per request, order-sensitive, credential excluded.
    pub fn resource(path: &str, query: Option<&str>) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        match query {
            Some(q) if !q.is_empty() => format!("{path}?{q}"),
            _ => path,
        }
    }

    /// Perform one GET against the upstream.
    pub async fn call(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = format!("{}{}", self.base_url, Self::resource(path, query));

        tracing::debug!(url = %url, "proxying request to upstream");

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(classify_transport)?;

        // 429 must stay distinguishable from the generic 4xx pass-through:
        // the queue retries on it.
        if status == 429 || status >= 500 {
            return Err(UpstreamError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        Ok(UpstreamResponse { status, body })
    }
}

fn classify_transport(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout
    } else if err.is_connect() {
        UpstreamError::Connect(err.to_string())
    } else {
        UpstreamError::Transport(err.to_string())
    }
}
