//! Outbound request governor.

pub mod scheduler;

pub use scheduler::RequestQueue;
