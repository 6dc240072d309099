//! RemoteCache: short-lived copies of aggregator responses.
//!
//! Capacity is bounded by moka. Expiry is judged against the injected
//! [`Clock`] on read, and an expired entry is evicted by the read that finds
//! it unless it was replaced meanwhile. There is no background timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::ops::compute::Op;
use moka::sync::Cache;
use serde::Serialize;
use serde_json::{Map, Value};
use tactics_core::Clock;
use tracing::debug;

/// Cached JSON object.
pub type Payload = Map<String, Value>;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Payload,
    fetched_at_millis: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct RemoteCache {
    entries: Cache<String, CacheEntry>,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
}

impl RemoteCache {
    pub fn new(ttl: Duration, max_entries: u64, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder().max_capacity(max_entries.max(1)).build();
        Self {
            entries,
            ttl_millis: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_millis as u64)
    }

    /// `None` for an absent or expired key. Entries stay valid while their
    /// age is at most the TTL.
    pub fn get(&self, key: &str) -> Option<Payload> {
        let Some(entry) = self.entries.get(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        let age = self.clock.now_millis().saturating_sub(entry.fetched_at_millis);
        if age > self.ttl_millis {
            // Only evict the entry judged stale; a concurrent put survives.
            let stale_at = entry.fetched_at_millis;
            let _ = self
                .entries
                .entry_by_ref(key)
                .and_compute_with(|current| match current {
                    Some(current) if current.value().fetched_at_millis == stale_at => Op::Remove,
                    _ => Op::Nop,
                });
            self.expired.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, age_ms = age, "cache entry expired");
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.payload)
    }

    /// Store `payload` stamped with the current time, replacing any previous
    /// entry. Empty payloads are refused.
    pub fn put(&self, key: &str, payload: Payload) -> bool {
        if payload.is_empty() {
            debug!(key, "refusing to cache empty payload");
            return false;
        }
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                fetched_at_millis: self.clock.now_millis(),
            },
        );
        true
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        CacheStats {
            entries: self.entries.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for RemoteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCache")
            .field("ttl_millis", &self.ttl_millis)
            .finish()
    }
}
