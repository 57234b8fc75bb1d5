//! Bounded, time-expiring response cache.
//!
//! # Responsibilities
//! - Serve previously fetched upstream bodies while they are fresh
//! - Lazily delete expired entries on lookup
//! - Evict the oldest-inserted entry when inserting beyond the cap
//!
//! Eviction is insertion-order, not least-recently-used: a hit never
//! refreshes an entry's position or timestamp. Keys are the upstream
//! resource (path + raw query string) so a hit corresponds 1:1 to a request
//! that would have produced an identical upstream call.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::CacheConfig;

struct CacheEntry {
    data: Value,
    inserted_at: Instant,
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order; always mirrors `entries` keys.
    order: VecDeque<String>,
}

/// In-memory response cache keyed by upstream resource.
pub struct ResponseCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    max_entries: usize,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl: Duration::from_secs(config.ttl_secs),
            max_entries: config.max_entries,
        }
    }

    /// Look up a fresh entry. An expired entry is deleted here and reported
    /// as absent.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut state = self.state.lock().await;
        let fresh = match state.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() < self.ttl,
            None => return None,
        };
        if fresh {
            return state.entries.get(key).map(|entry| entry.data.clone());
        }
        state.entries.remove(key);
        state.order.retain(|k| k != key);
        tracing::debug!(key, "cache entry expired");
        None
    }

    /// Insert or overwrite. An overwrite refreshes the timestamp but keeps
    /// the key's original insertion position; a new key beyond the cap
    /// evicts the single oldest-inserted entry first.
    pub async fn put(&self, key: String, data: Value) {
        let mut state = self.state.lock().await;
        let inserted_at = Instant::now();
        if state.entries.contains_key(&key) {
            state.entries.insert(key, CacheEntry { data, inserted_at });
            return;
        }
        if state.entries.len() >= self.max_entries {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
                tracing::debug!(key = %oldest, "evicted oldest cache entry");
            }
        }
        state.order.push_back(key.clone());
        state.entries.insert(key, CacheEntry { data, inserted_at });
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Empty the store. Development-mode maintenance only.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.order.clear();
        tracing::info!("response cache cleared");
    }
}
