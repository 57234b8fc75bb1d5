//! Response caching.

pub mod store;

pub use store::ResponseCache;
