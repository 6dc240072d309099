//! Runs persist/sync cycles off the tick thread.
//!
//! A cycle executes on tokio's blocking pool under a timeout. At most one
//! cycle is in flight; a trigger that arrives while one runs is skipped.
//! A timed-out cycle is abandoned: its dirty flags were not cleared, so the
//! next cycle covers the same subjects.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::runtime::{CycleReport, TacticsRuntime};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub completed: u64,
    pub skipped: u64,
    pub timed_out: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    skipped: AtomicU64,
    timed_out: AtomicU64,
    failed: AtomicU64,
}

/// Clears the in-flight flag however the cycle task ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct BackgroundWorker {
    runtime: Arc<TacticsRuntime>,
    handle: Handle,
    timeout: Duration,
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl BackgroundWorker {
    /// Timeout comes from `runtime.cycle_timeout_secs`.
    pub fn new(runtime: Arc<TacticsRuntime>, handle: Handle) -> Self {
        let timeout = Duration::from_secs(runtime.config().runtime.cycle_timeout_secs.max(1));
        Self {
            runtime,
            handle,
            timeout,
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn runtime(&self) -> &Arc<TacticsRuntime> {
        &self.runtime
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Count a tick and start a cycle when autosave is due.
    pub fn on_tick(&self) -> Option<JoinHandle<Option<CycleReport>>> {
        if self.runtime.on_tick() {
            self.trigger()
        } else {
            None
        }
    }

    /// Start a cycle now. `None` when one is already in flight. The task
    /// resolves to `None` when the cycle timed out or panicked.
    pub fn trigger(&self) -> Option<JoinHandle<Option<CycleReport>>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            info!("previous cycle still running, skipping");
            return None;
        }

        let guard = InFlight(self.running.clone());
        let runtime = self.runtime.clone();
        let counters = self.counters.clone();
        let timeout = self.timeout;
        Some(self.handle.spawn(async move {
            let _guard = guard;
            let cycle = tokio::task::spawn_blocking(move || runtime.run_cycle());
            match tokio::time::timeout(timeout, cycle).await {
                Ok(Ok(report)) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                    Some(report)
                }
                Ok(Err(e)) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    error!(error = %e, "cycle task failed");
                    None
                }
                Err(_) => {
                    counters.timed_out.fetch_add(1, Ordering::Relaxed);
                    warn!(timeout_secs = timeout.as_secs_f64(), "cycle timed out, abandoned");
                    None
                }
            }
        }))
    }

    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            completed: self.counters.completed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            timed_out: self.counters.timed_out.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}
