use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bser_proxy::config;
use bser_proxy::ProxyServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bser_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("bser-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    // A missing BSER_API_KEY fails here, before anything listens.
    let config = config::load_config()?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        requests_per_second = config.rate_limit.requests_per_second,
        max_retries = config.rate_limit.max_retries,
        cache_ttl_secs = config.cache.ttl_secs,
        cache_max_entries = config.cache.max_entries,
        development = config.development,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = ProxyServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
