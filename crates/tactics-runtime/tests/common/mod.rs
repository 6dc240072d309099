#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tactics_core::errors::SyncError;
use tactics_core::models::AggregateStatus;
use tactics_core::{Clock, ManualClock};
use tactics_runtime::{RuntimeOptions, TacticsRuntime};
use tactics_sync::{AggregatorTransport, ModelUpload};

pub const SMALL_CONFIG: &str = r#"
[learning]
hidden_size = 8
approximator_batch_size = 4
min_training_examples = 2
seed = 11

[learning.boosting]
batch_size = 8
rounds = 3

[learning.forest]
batch_size = 8
n_trees = 5

[storage]
max_backups = 2

[runtime]
autosave_interval_ticks = 3
"#;

/// Counts uploads; optionally slow.
#[derive(Debug, Default)]
pub struct CountingTransport {
    pub uploads: AtomicUsize,
    pub delay: Duration,
}

impl CountingTransport {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

impl AggregatorTransport for CountingTransport {
    fn upload(&self, _upload: &ModelUpload) -> Result<AggregateStatus, SyncError> {
        std::thread::sleep(self.delay);
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        Ok(AggregateStatus {
            round: n,
            contributors: 1,
            models_in_round: n,
            has_global_model: false,
        })
    }

    fn fetch_status(&self) -> Result<AggregateStatus, SyncError> {
        Ok(AggregateStatus::default())
    }

    fn download_global_model(&self) -> Result<Option<Vec<u8>>, SyncError> {
        Ok(None)
    }
}

pub fn options(root: &Path, clock: &Arc<ManualClock>) -> RuntimeOptions {
    RuntimeOptions::default()
        .with_root(root)
        .with_config_toml(SMALL_CONFIG)
        .with_clock(clock.clone() as Arc<dyn Clock>)
}

pub fn runtime(root: &Path, clock: &Arc<ManualClock>) -> TacticsRuntime {
    TacticsRuntime::new(options(root, clock)).unwrap()
}
