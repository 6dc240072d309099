//! Per-subject dirty bookkeeping.
//!
//! Every `mark_dirty*` bumps the subject's generation. A flush takes a
//! [`checkpoint`](ChangeTracker::checkpoint) before doing I/O and, once the
//! I/O succeeded, hands each token back to
//! [`mark_clean_if_unchanged`](ChangeTracker::mark_clean_if_unchanged).
//! Changes that landed while the flush was in flight keep the subject dirty.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tactics_core::Clock;
use tracing::debug;

#[derive(Debug, Default)]
struct SubjectState {
    dirty: bool,
    generation: u64,
    sub_keys: BTreeSet<String>,
    last_clean_millis: Option<i64>,
}

/// What a flush saw for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyToken {
    pub subject: String,
    pub generation: u64,
    pub sub_keys: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeTrackerStats {
    pub tracked: usize,
    pub dirty: usize,
    pub dirty_sub_keys: usize,
    pub marks: u64,
    pub cleans: u64,
}

pub struct ChangeTracker {
    name: &'static str,
    subjects: DashMap<String, SubjectState>,
    clock: Arc<dyn Clock>,
    marks: AtomicU64,
    cleans: AtomicU64,
}

impl ChangeTracker {
    /// `name` only shows up in logs ("persist", "upload").
    pub fn new(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            subjects: DashMap::new(),
            clock,
            marks: AtomicU64::new(0),
            cleans: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mark_dirty(&self, subject: &str) {
        let mut state = self.subjects.entry(subject.to_string()).or_default();
        state.dirty = true;
        state.generation += 1;
        self.marks.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark `subject` dirty and remember which part of it changed.
    pub fn mark_dirty_sub(&self, subject: &str, sub_key: &str) {
        let mut state = self.subjects.entry(subject.to_string()).or_default();
        state.dirty = true;
        state.generation += 1;
        state.sub_keys.insert(sub_key.to_string());
        self.marks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_dirty(&self, subject: &str) -> bool {
        self.subjects.get(subject).is_some_and(|s| s.dirty)
    }

    pub fn has_any_dirty(&self) -> bool {
        self.subjects.iter().any(|s| s.dirty)
    }

    /// Dirty subjects, sorted.
    pub fn dirty_subjects(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .subjects
            .iter()
            .filter(|s| s.dirty)
            .map(|s| s.key().clone())
            .collect();
        out.sort();
        out
    }

    pub fn dirty_sub_keys(&self, subject: &str) -> BTreeSet<String> {
        self.subjects
            .get(subject)
            .map(|s| s.sub_keys.clone())
            .unwrap_or_default()
    }

    /// Clear coarse and fine state and stamp the current time as last clean.
    pub fn mark_clean(&self, subject: &str) {
        let now = self.clock.now_millis();
        let mut state = self.subjects.entry(subject.to_string()).or_default();
        state.dirty = false;
        state.sub_keys.clear();
        state.last_clean_millis = Some(now);
        self.cleans.fetch_add(1, Ordering::Relaxed);
    }

    /// [`Duration::MAX`] when the subject was never cleaned.
    pub fn time_since_last_save(&self, subject: &str) -> Duration {
        let Some(last) = self.subjects.get(subject).and_then(|s| s.last_clean_millis) else {
            return Duration::MAX;
        };
        let elapsed = self.clock.now_millis().saturating_sub(last).max(0);
        Duration::from_millis(elapsed as u64)
    }

    /// One token per dirty subject, sorted by subject.
    pub fn checkpoint(&self) -> Vec<DirtyToken> {
        let mut tokens: Vec<DirtyToken> = self
            .subjects
            .iter()
            .filter(|s| s.dirty)
            .map(|s| DirtyToken {
                subject: s.key().clone(),
                generation: s.generation,
                sub_keys: s.sub_keys.clone(),
            })
            .collect();
        tokens.sort_by(|a, b| a.subject.cmp(&b.subject));
        tokens
    }

    /// Clean the subject if nothing changed since `token` was taken. Otherwise
    /// drop only the sub-keys the token covered and leave the subject dirty.
    /// Returns whether the subject is now clean.
    pub fn mark_clean_if_unchanged(&self, token: &DirtyToken) -> bool {
        let now = self.clock.now_millis();
        let Some(mut state) = self.subjects.get_mut(&token.subject) else {
            return false;
        };
        if state.generation == token.generation {
            state.dirty = false;
            state.sub_keys.clear();
            state.last_clean_millis = Some(now);
            self.cleans.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            for key in &token.sub_keys {
                state.sub_keys.remove(key);
            }
            debug!(
                tracker = self.name,
                subject = %token.subject,
                "changed during flush, staying dirty"
            );
            false
        }
    }

    /// Forget every subject, including last-clean stamps.
    pub fn clear_all(&self) {
        self.subjects.clear();
    }

    pub fn stats(&self) -> ChangeTrackerStats {
        let mut stats = ChangeTrackerStats {
            marks: self.marks.load(Ordering::Relaxed),
            cleans: self.cleans.load(Ordering::Relaxed),
            ..Default::default()
        };
        for state in self.subjects.iter() {
            stats.tracked += 1;
            if state.dirty {
                stats.dirty += 1;
                stats.dirty_sub_keys += state.sub_keys.len();
            }
        }
        stats
    }
}

impl std::fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("name", &self.name)
            .field("tracked", &self.subjects.len())
            .finish()
    }
}
