//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Construct the queue, cache and upstream client once at startup
//! - Build the Axum router and wire up middleware (CORS, tracing)
//! - Bind the server to a listener with graceful shutdown

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::http::handlers;
use crate::queue::RequestQueue;
use crate::upstream::UpstreamClient;

/// Application state injected into handlers.
///
/// All shared pieces are constructed exactly once here and owned through
/// `Arc`s; there is no ambient global state.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<RequestQueue>,
    pub cache: Arc<ResponseCache>,
    pub upstream: Arc<UpstreamClient>,
    pub development: bool,
    pub started_at: Instant,
}

/// HTTP server for the stats proxy.
pub struct ProxyServer {
    router: Router,
    config: ProxyConfig,
}

impl ProxyServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let state = AppState {
            queue: Arc::new(RequestQueue::new(&config.rate_limit)),
            cache: Arc::new(ResponseCache::new(&config.cache)),
            upstream: Arc::new(UpstreamClient::new(&config.upstream)?),
            development: config.development,
            started_at: Instant::now(),
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/api/{*path}", get(handlers::proxy))
            .route("/health", get(handlers::health));
        if config.development {
            router = router.route("/cache/clear", post(handlers::clear_cache));
        }
        router
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            development = self.config.development,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
