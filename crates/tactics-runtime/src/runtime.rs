//! The runtime context object.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tactics_core::constants::files;
use tactics_core::errors::{StorageError, TacticsError, TacticsResult};
use tactics_core::{
    BackendKind, Clock, FeatureVector, Label, Situation, SystemClock, TacticsConfig,
    TrainingStatus,
};
use tactics_learning::{Decision, LearningEngine};
use tactics_storage::{locate_root, ModelStore, SaveReport};
use tactics_sync::{
    ActivityGate, ActivityStats, AggregatorTransport, ChangeTracker, ChangeTrackerStats,
    DeltaSource, SyncEngine, SyncOutcome, SyncStats,
};
use tracing::{debug, error, info, warn};

/// Everything [`TacticsRuntime::new`] needs. Unset fields fall back to the
/// config, then to defaults.
#[derive(Default)]
pub struct RuntimeOptions {
    /// Model root. Overrides `storage.root` and directory discovery.
    pub root: Option<PathBuf>,
    pub config: Option<TacticsConfig>,
    /// Already-read TOML; takes precedence over `config`.
    pub config_toml: Option<String>,
    /// Aggregator transport. When set, remote sync is on regardless of
    /// `sync.enabled`.
    pub transport: Option<Arc<dyn AggregatorTransport>>,
    pub clock: Option<Arc<dyn Clock>>,
}

impl RuntimeOptions {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_config(mut self, config: TacticsConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_config_toml(mut self, toml: impl Into<String>) -> Self {
        self.config_toml = Some(toml.into());
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn AggregatorTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

/// What one background cycle did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// `None` when the save was abandoned; the reason was logged.
    pub persist: Option<SaveReport>,
    pub sync: SyncOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStats {
    pub ticks: u64,
    pub persist: ChangeTrackerStats,
    pub upload: ChangeTrackerStats,
    pub activity: ActivityStats,
    pub sync: SyncStats,
    /// Backend component to subject type to buffered examples.
    pub buffered: BTreeMap<String, BTreeMap<String, usize>>,
    pub backups: usize,
}

pub struct TacticsRuntime {
    config: TacticsConfig,
    clock: Arc<dyn Clock>,
    store: ModelStore,
    engine: LearningEngine,
    persist: Arc<ChangeTracker>,
    sync: SyncEngine,
    activity: ActivityGate,
    ticks: AtomicU64,
}

impl TacticsRuntime {
    /// One-time initialization: parse config, open the store, build the
    /// backends and load whatever was saved. Only an unusable storage
    /// directory or unparseable config is an error; corrupt model files are
    /// deleted and the affected backend starts fresh.
    pub fn new(options: RuntimeOptions) -> TacticsResult<Self> {
        let config = match options.config_toml {
            Some(source) => TacticsConfig::from_toml(&source)
                .map_err(|e| TacticsError::ConfigError(e.to_string()))?,
            None => options.config.unwrap_or_default(),
        };
        let clock: Arc<dyn Clock> = options
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let root = options
            .root
            .or_else(|| config.storage.root.as_ref().map(PathBuf::from))
            .unwrap_or_else(locate_root);
        let store = ModelStore::open(root, &config.storage, clock.clone())?;

        let engine = LearningEngine::new(&config.learning);
        load_saved_state(&store, &engine);

        let transport = options
            .transport
            .or_else(|| remote_transport(&config));
        let persist = Arc::new(ChangeTracker::new("persist", clock.clone()));
        let upload = Arc::new(ChangeTracker::new("upload", clock.clone()));
        let sync = SyncEngine::new(&config.sync, upload, transport, clock.clone());
        let activity = ActivityGate::new(
            Duration::from_secs(config.activity.inactivity_threshold_secs),
            clock.clone(),
        );

        info!(
            root = %store.root().display(),
            backends = engine.backends().len(),
            remote = sync.is_enabled(),
            "tactics runtime ready"
        );
        Ok(Self {
            config,
            clock,
            store,
            engine,
            persist,
            sync,
            activity,
            ticks: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &TacticsConfig {
        &self.config
    }

    pub fn engine(&self) -> &LearningEngine {
        &self.engine
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn sync_engine(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn activity(&self) -> &ActivityGate {
        &self.activity
    }

    pub fn persist_tracker(&self) -> &ChangeTracker {
        &self.persist
    }

    pub fn upload_tracker(&self) -> &ChangeTracker {
        self.sync.tracker()
    }

    pub fn record_activity(&self, subject_id: &str) {
        self.activity.record_activity(subject_id);
    }

    /// Pick an action for `subject_id`. `None` when the subject is idle or no
    /// backend has a model yet; the host then uses its default behavior.
    pub fn decide(
        &self,
        subject_id: &str,
        subject_type: &str,
        situation: &Situation,
    ) -> Option<Decision> {
        if self.activity.should_skip(subject_id) {
            return None;
        }
        self.engine.decide(subject_type, situation)
    }

    /// Feed an outcome to every backend and mark the subject type dirty for
    /// both persistence and upload.
    pub fn report_outcome(
        &self,
        subject_type: &str,
        features: &FeatureVector,
        label: Label,
    ) -> Vec<(BackendKind, TrainingStatus)> {
        let _span = crate::learning_span!(subject_type).entered();
        let statuses = self.engine.record_outcome(subject_type, features, label);
        let action = label.action().to_string();
        self.persist.mark_dirty_sub(subject_type, &action);
        self.upload_tracker().mark_dirty_sub(subject_type, &action);
        for (kind, status) in &statuses {
            if status.is_trained() {
                debug!(subject_type, backend = %kind, "batch trained");
            }
        }
        statuses
    }

    /// Count a host tick. True when an autosave cycle is due.
    pub fn on_tick(&self) -> bool {
        let interval = self.config.runtime.autosave_interval_ticks.max(1);
        let ticks = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        ticks % interval == 0
    }

    /// Back up and save every backend plus the knowledge base when anything
    /// is dirty. Subjects are cleaned only when every save succeeded.
    pub fn persist_cycle(&self) -> TacticsResult<SaveReport> {
        let tokens = self.persist.checkpoint();
        if tokens.is_empty() {
            debug!("nothing dirty, save skipped");
            return Ok(SaveReport::default());
        }
        let _span = crate::persist_span!(tokens.len()).entered();

        let mut report = self.store.save_all(self.engine.backends())?;
        match self.save_knowledge() {
            Ok((component, files)) => report.saved.push((component, files)),
            Err(e) => {
                error!(error = %e, "failed to save knowledge base");
                report.failed.push(("tactic_knowledge".to_string(), e.to_string()));
            }
        }

        if report.is_complete() {
            for token in &tokens {
                self.persist.mark_clean_if_unchanged(token);
            }
            info!(
                subjects = tokens.len(),
                files = report.files_written(),
                "models saved"
            );
        } else {
            warn!(failed = report.failed.len(), "save incomplete, subjects stay dirty");
        }
        Ok(report)
    }

    /// Upload dirty subjects when remote sync is on.
    pub fn sync_cycle(&self) -> SyncOutcome {
        let _span = crate::sync_span!(self.upload_tracker().stats().dirty).entered();
        self.sync.push_dirty(&KnowledgeDeltas {
            engine: &self.engine,
        })
    }

    /// Persist, then sync. A failed save is logged and does not stop the
    /// upload.
    pub fn run_cycle(&self) -> CycleReport {
        let persist = match self.persist_cycle() {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "persist cycle abandoned");
                None
            }
        };
        let sync = self.sync_cycle();
        CycleReport { persist, sync }
    }

    /// Final flush.
    pub fn shutdown(&self) -> TacticsResult<SaveReport> {
        let report = self.persist_cycle()?;
        info!(files = report.files_written(), "tactics runtime shut down");
        Ok(report)
    }

    pub fn stats(&self) -> RuntimeStats {
        let buffered = self
            .engine
            .backends()
            .iter()
            .filter(|b| b.is_available())
            .map(|b| {
                let counts: BTreeMap<String, usize> = b.buffered_counts().into_iter().collect();
                (b.component().to_string(), counts)
            })
            .collect();
        RuntimeStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            persist: self.persist.stats(),
            upload: self.upload_tracker().stats(),
            activity: self.activity.stats(),
            sync: self.sync.stats(),
            buffered,
            backups: self.store.list_backups().map(|b| b.len()).unwrap_or(0),
        }
    }

    fn save_knowledge(&self) -> TacticsResult<(String, usize)> {
        let knowledge = self.engine.knowledge();
        let snapshot = knowledge.snapshot(self.clock.now_millis())?;
        let component = snapshot.component.clone();
        let written = self
            .store
            .save_files(vec![(knowledge.file_name(), snapshot)])?;
        Ok((component, written.len()))
    }
}

impl std::fmt::Debug for TacticsRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TacticsRuntime")
            .field("root", &self.store.root())
            .field("ticks", &self.ticks.load(Ordering::Relaxed))
            .finish()
    }
}

/// Restore every backend and the knowledge base. Failures leave the
/// affected component fresh.
fn load_saved_state(store: &ModelStore, engine: &LearningEngine) {
    for backend in engine.backends() {
        match store.load_backend(backend.as_ref()) {
            Ok(0) => debug!(component = backend.component(), "no saved model"),
            Ok(files) => debug!(component = backend.component(), files, "model loaded"),
            Err(StorageError::LoadFailedStartFresh { .. }) => {}
            Err(e) => warn!(component = backend.component(), error = %e, "cannot load model, starting fresh"),
        }
    }
    match store.load_snapshot(files::KNOWLEDGE_BASE) {
        Ok(Some(snapshot)) => {
            if let Err(e) = engine.knowledge().restore(&snapshot) {
                warn!(error = %e, "cannot restore knowledge base, starting fresh");
            }
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "cannot load knowledge base, starting fresh"),
    }
}

#[cfg(feature = "remote")]
fn remote_transport(config: &TacticsConfig) -> Option<Arc<dyn AggregatorTransport>> {
    if !config.sync.enabled || config.sync.endpoint.is_empty() {
        return None;
    }
    match tactics_sync::HttpTransport::new(&config.sync) {
        Ok(transport) => Some(Arc::new(transport) as Arc<dyn AggregatorTransport>),
        Err(e) => {
            warn!(error = %e, "cannot build HTTP transport, remote sync off");
            None
        }
    }
}

#[cfg(not(feature = "remote"))]
fn remote_transport(config: &TacticsConfig) -> Option<Arc<dyn AggregatorTransport>> {
    if config.sync.enabled {
        warn!("remote sync enabled but the `remote` feature is not compiled in");
    }
    None
}

/// Uploads the knowledge base's per-action counts for each dirty subject.
struct KnowledgeDeltas<'a> {
    engine: &'a LearningEngine,
}

impl DeltaSource for KnowledgeDeltas<'_> {
    fn subject_delta(
        &self,
        subject: &str,
        sub_keys: &BTreeSet<String>,
    ) -> Option<serde_json::Value> {
        let actions = self.engine.knowledge().subject_summary(subject)?;
        Some(serde_json::json!({
            "actions": actions,
            "changedActions": sub_keys,
        }))
    }
}
