//! SyncEngine: push dirty subjects to the aggregator and keep its status
//! cached.
//!
//! A push is: checkpoint the upload tracker, ask the [`DeltaSource`] for each
//! dirty subject's data, encode, upload. Only after the transport reported
//! success are the checkpointed tokens cleaned; any failure leaves every
//! subject dirty for the next cycle.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tactics_core::config::SyncConfig;
use tactics_core::errors::SyncError;
use tactics_core::models::AggregateStatus;
use tactics_core::Clock;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, RemoteCache};
use crate::change_tracker::ChangeTracker;
use crate::codec::{CompressionStats, PayloadCodec};
use crate::transport::protocol::{DeltaDocument, ModelUpload, SubjectDelta};
use crate::transport::AggregatorTransport;

const STATUS_CACHE_KEY: &str = "aggregate_status";

/// Supplies the data to upload for a subject.
pub trait DeltaSource {
    /// `None` when there is nothing worth sending for `subject`.
    fn subject_delta(&self, subject: &str, sub_keys: &BTreeSet<String>)
        -> Option<serde_json::Value>;
}

/// Result of one [`SyncEngine::push_dirty`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// No transport configured.
    Disabled,
    /// No dirty subjects, or none with data.
    NothingToSend,
    Uploaded {
        subjects: Vec<String>,
        bytes: usize,
        compressed: bool,
        status: AggregateStatus,
        /// Present when pulling was enabled and the aggregator had one.
        global_model: Option<Vec<u8>>,
    },
    /// The round was skipped; dirty state is intact.
    Offline { reason: String, retryable: bool },
}

impl SyncOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, SyncOutcome::Uploaded { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SyncStats {
    pub uploads: u64,
    pub failures: u64,
    pub bytes_sent: u64,
    pub status_fetches: u64,
    pub cache: CacheStats,
    pub compression: CompressionStats,
}

pub struct SyncEngine {
    tracker: Arc<ChangeTracker>,
    cache: RemoteCache,
    codec: PayloadCodec,
    transport: Option<Arc<dyn AggregatorTransport>>,
    client_id: String,
    pull_global_model: bool,
    uploads: AtomicU64,
    failures: AtomicU64,
    bytes_sent: AtomicU64,
    status_fetches: AtomicU64,
}

impl SyncEngine {
    /// `tracker` is the upload tracker; the engine cleans it, nothing else
    /// should.
    pub fn new(
        config: &SyncConfig,
        tracker: Arc<ChangeTracker>,
        transport: Option<Arc<dyn AggregatorTransport>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let client_id = uuid::Uuid::new_v4().to_string();
        info!(
            client_id = %client_id,
            remote = transport.is_some(),
            "sync engine initialized"
        );
        Self {
            tracker,
            cache: RemoteCache::new(
                Duration::from_secs(config.cache_ttl_secs),
                config.cache_max_entries,
                clock,
            ),
            codec: PayloadCodec::new(config.compression_threshold_bytes),
            transport,
            client_id,
            pull_global_model: config.pull_global_model,
            uploads: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            status_fetches: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn tracker(&self) -> &Arc<ChangeTracker> {
        &self.tracker
    }

    pub fn cache(&self) -> &RemoteCache {
        &self.cache
    }

    pub fn codec(&self) -> &PayloadCodec {
        &self.codec
    }

    pub fn push_dirty(&self, source: &dyn DeltaSource) -> SyncOutcome {
        let Some(transport) = &self.transport else {
            return SyncOutcome::Disabled;
        };
        let tokens = self.tracker.checkpoint();
        if tokens.is_empty() {
            return SyncOutcome::NothingToSend;
        }

        let mut deltas = Vec::with_capacity(tokens.len());
        let mut covered = Vec::with_capacity(tokens.len());
        for token in tokens {
            match source.subject_delta(&token.subject, &token.sub_keys) {
                Some(data) => {
                    deltas.push(SubjectDelta {
                        subject: token.subject.clone(),
                        sub_keys: token.sub_keys.iter().cloned().collect(),
                        data,
                    });
                    covered.push(token);
                }
                None => {
                    // Nothing to send counts as sent.
                    self.tracker.mark_clean_if_unchanged(&token);
                }
            }
        }
        if deltas.is_empty() {
            return SyncOutcome::NothingToSend;
        }

        let subjects: Vec<String> = deltas.iter().map(|d| d.subject.clone()).collect();
        let document = DeltaDocument::new(self.client_id.clone(), deltas);
        let json = match serde_json::to_string(&document) {
            Ok(json) => json,
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "cannot serialize delta document");
                return SyncOutcome::Offline {
                    reason: e.to_string(),
                    retryable: false,
                };
            }
        };
        let upload = ModelUpload::new(self.client_id.clone(), subjects.clone(), self.codec.encode(&json));

        let status = match transport.upload(&upload) {
            Ok(status) => status,
            Err(e) => return self.offline(e),
        };
        for token in &covered {
            self.tracker.mark_clean_if_unchanged(token);
        }
        self.cache.put(STATUS_CACHE_KEY, status.to_payload());
        self.uploads.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent
            .fetch_add(upload.body.len() as u64, Ordering::Relaxed);
        info!(
            request_id = %upload.request_id,
            subjects = subjects.len(),
            bytes = upload.body.len(),
            compressed = upload.compressed,
            round = status.round,
            "delta uploaded"
        );

        let global_model = if self.pull_global_model && status.has_global_model {
            match self.pull_global_model() {
                Ok(model) => model,
                Err(e) => {
                    warn!(error = %e, "global model download failed");
                    None
                }
            }
        } else {
            None
        };

        SyncOutcome::Uploaded {
            subjects,
            bytes: upload.body.len(),
            compressed: upload.compressed,
            status,
            global_model,
        }
    }

    /// Aggregator status, from cache within the TTL, else fetched and cached.
    pub fn aggregate_status(&self) -> Result<AggregateStatus, SyncError> {
        if let Some(status) = self
            .cache
            .get(STATUS_CACHE_KEY)
            .and_then(|payload| AggregateStatus::from_payload(&payload))
        {
            return Ok(status);
        }
        let transport = self.transport.as_ref().ok_or(SyncError::Disabled)?;
        self.status_fetches.fetch_add(1, Ordering::Relaxed);
        let status = transport.fetch_status()?;
        self.cache.put(STATUS_CACHE_KEY, status.to_payload());
        debug!(round = status.round, "aggregate status fetched");
        Ok(status)
    }

    pub fn pull_global_model(&self) -> Result<Option<Vec<u8>>, SyncError> {
        let transport = self.transport.as_ref().ok_or(SyncError::Disabled)?;
        let model = transport.download_global_model()?;
        if let Some(bytes) = &model {
            info!(bytes = bytes.len(), "global model downloaded");
        }
        Ok(model)
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            uploads: self.uploads.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            status_fetches: self.status_fetches.load(Ordering::Relaxed),
            cache: self.cache.stats(),
            compression: self.codec.stats(),
        }
    }

    fn offline(&self, err: SyncError) -> SyncOutcome {
        self.failures.fetch_add(1, Ordering::Relaxed);
        warn!(error = %err, "sync round skipped, dirty state kept");
        SyncOutcome::Offline {
            retryable: err.is_retryable(),
            reason: err.to_string(),
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("client_id", &self.client_id)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
