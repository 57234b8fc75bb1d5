//! Rate-governed proxy for the Eternal Return open API.
//!
//! The upstream enforces a strict requests-per-second quota and answers 429
//! on violation, so every outbound call goes through a single-flight queue
//! that paces request starts, retries rate-limited items, and sits behind a
//! bounded TTL response cache.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http (axum handlers) ──▶ cache ──hit──▶ respond
//!                     │                   │
//!                     │                 miss
//!                     ▼                   │
//!               queue (single-flight, ◀───┘
//!               min-interval pacing,
//!               429 retry + cooldown)
//!                     │
//!                     ▼
//!               upstream adapter (URL + x-api-key + timeout)
//!                     │
//!                     ▼
//!               open-api.bser.io
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod queue;
pub mod upstream;

pub use config::ProxyConfig;
pub use http::ProxyServer;
