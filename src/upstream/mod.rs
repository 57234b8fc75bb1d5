//! Upstream API client.

pub mod client;
pub mod error;

pub use client::{UpstreamClient, UpstreamResponse};
pub use error::UpstreamError;
