//! Configuration loading from the environment.
//!
//! The proxy is configured entirely through environment variables so it can
//! run next to the front-end dev server without a config file. A missing API
//! key is fatal at startup: every upstream call needs the credential and the
//! upstream rejects anonymous requests outright.

use std::env;

use crate::config::schema::ProxyConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Load configuration from process environment variables.
pub fn load_config() -> Result<ProxyConfig, ConfigError> {
    from_lookup(|key| env::var(key).ok())
}

/// Load configuration from an arbitrary variable lookup.
///
/// Split out from [`load_config`] so tests can supply variables without
/// mutating process-global environment state.
pub fn from_lookup<F>(lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ProxyConfig::default();

    config.upstream.api_key = match lookup("BSER_API_KEY") {
        Some(key) if !key.trim().is_empty() => key,
        _ => return Err(ConfigError::Missing("BSER_API_KEY")),
    };

    if let Some(port) = lookup("PORT") {
        let port: u16 = parse(&port, "PORT")?;
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }
    if let Some(url) = lookup("BSER_API_URL") {
        config.upstream.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
        config.upstream.timeout_secs = parse(&secs, "UPSTREAM_TIMEOUT_SECS")?;
    }
    if let Some(rps) = lookup("REQUESTS_PER_SECOND") {
        let rps: f64 = parse(&rps, "REQUESTS_PER_SECOND")?;
        if rps <= 0.0 {
            return Err(ConfigError::Invalid {
                var: "REQUESTS_PER_SECOND",
                value: rps.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        config.rate_limit.requests_per_second = rps;
    }
    if let Some(retries) = lookup("MAX_RETRIES") {
        config.rate_limit.max_retries = parse(&retries, "MAX_RETRIES")?;
    }
    if let Some(ms) = lookup("RETRY_COOLDOWN_MS") {
        config.rate_limit.cooldown_ms = parse(&ms, "RETRY_COOLDOWN_MS")?;
    }
    if let Some(secs) = lookup("CACHE_TTL_SECS") {
        config.cache.ttl_secs = parse(&secs, "CACHE_TTL_SECS")?;
    }
    if let Some(n) = lookup("CACHE_MAX_ENTRIES") {
        config.cache.max_entries = parse(&n, "CACHE_MAX_ENTRIES")?;
    }
    config.development = matches!(
        lookup("NODE_ENV").or_else(|| lookup("APP_ENV")).as_deref(),
        Some("development") | Some("dev")
    );

    Ok(config)
}

fn parse<T: std::str::FromStr>(value: &str, var: &'static str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
