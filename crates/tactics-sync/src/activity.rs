//! Idle-subject gating.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tactics_core::Clock;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStats {
    pub tracked: usize,
    pub skipped: u64,
}

/// Subject id to last-seen millis. A subject seen for the first time counts
/// as active.
pub struct ActivityGate {
    last_seen: DashMap<String, i64>,
    threshold_millis: i64,
    clock: Arc<dyn Clock>,
    skipped: AtomicU64,
}

impl ActivityGate {
    pub fn new(threshold: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            last_seen: DashMap::new(),
            threshold_millis: i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX),
            clock,
            skipped: AtomicU64::new(0),
        }
    }

    pub fn record_activity(&self, subject_id: &str) {
        self.last_seen
            .insert(subject_id.to_string(), self.clock.now_millis());
    }

    /// Idle for less than the threshold. Unknown subjects are recorded now
    /// and reported active whatever the threshold.
    pub fn is_active(&self, subject_id: &str) -> bool {
        let now = self.clock.now_millis();
        match self.last_seen.entry(subject_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
            Entry::Occupied(seen) => now.saturating_sub(*seen.get()) < self.threshold_millis,
        }
    }

    /// `!is_active`, counting each skip.
    pub fn should_skip(&self, subject_id: &str) -> bool {
        let skip = !self.is_active(subject_id);
        if skip {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            debug!(subject_id, "skipping idle subject");
        }
        skip
    }

    pub fn remove(&self, subject_id: &str) {
        self.last_seen.remove(subject_id);
    }

    pub fn time_since_activity(&self, subject_id: &str) -> Option<Duration> {
        let last = *self.last_seen.get(subject_id)?;
        let idle = self.clock.now_millis().saturating_sub(last).max(0);
        Some(Duration::from_millis(idle as u64))
    }

    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            tracked: self.last_seen.len(),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }

    /// Forget every subject and reset the skip counter.
    pub fn clear(&self) {
        self.last_seen.clear();
        self.skipped.store(0, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for ActivityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityGate")
            .field("threshold_millis", &self.threshold_millis)
            .field("tracked", &self.last_seen.len())
            .finish()
    }
}
