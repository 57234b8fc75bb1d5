//! Configuration management.

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{CacheConfig, ListenerConfig, ProxyConfig, RateLimitConfig, UpstreamConfig};
