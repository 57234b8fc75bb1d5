//! Configuration schema definitions.
//!
//! Each section owns its own defaults; the loader only overrides fields
//! that are present in the environment.

/// Root configuration for the proxy.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream API settings (base URL, credential, timeout).
    pub upstream: UpstreamConfig,

    /// Outbound rate governor settings.
    pub rate_limit: RateLimitConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Development mode: verbose error detail and the cache-clear endpoint.
    pub development: bool,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the upstream API, without a trailing slash.
    pub base_url: String,

    /// Static API key sent as the `x-api-key` header on every call.
    /// Kept out of the startup log and the health payload.
    pub api_key: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://open-api.bser.io".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Outbound rate governor configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Upstream quota in requests per second. May be fractional;
    /// the minimum inter-request interval is `1000ms / requests_per_second`.
    pub requests_per_second: f64,

    /// Maximum retries for a single item after rate-limit failures.
    pub max_retries: u32,

    /// Cooldown applied to the whole queue after a rate-limit failure,
    /// in milliseconds.
    pub cooldown_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 0.8,
            max_retries: 3,
            cooldown_ms: 2000,
        }
    }
}

impl RateLimitConfig {
    /// Minimum interval between successive upstream request starts.
    pub fn min_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis((1000.0 / self.requests_per_second) as u64)
    }

    /// Queue-wide pause after a rate-limit failure.
    pub fn cooldown(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.cooldown_ms)
    }
}

/// Response cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,

    /// Maximum number of live entries; the oldest-inserted entry is
    /// evicted when inserting beyond this cap.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 100,
        }
    }
}
