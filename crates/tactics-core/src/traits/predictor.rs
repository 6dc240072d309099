use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::{StorageError, TacticsResult};
use crate::models::{
    BackendKind, FeatureVector, Label, LearningPhase, ModelSnapshot, TrainingStatus,
};

/// A learning backend that maps feature vectors to tactic indices.
///
/// Implementations own their per-subject buffers and models and must be
/// safe to call from the decision path and the background worker at the
/// same time. `predict` never blocks on a training run.
pub trait PredictorBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Component name used in snapshots and metadata keys.
    fn component(&self) -> &'static str {
        self.kind().component()
    }

    /// Model files this backend persists, relative to the storage root.
    fn file_names(&self) -> &'static [&'static str];

    /// False when the backend was compiled out or failed to initialize.
    fn is_available(&self) -> bool;

    /// Best action for `subject`, or `None` when no model is ready.
    fn predict(&self, subject: &str, features: &FeatureVector) -> Option<usize>;

    /// Buffer an example; may trigger a synchronous batch when the buffer fills.
    fn record_outcome(&self, subject: &str, features: FeatureVector, label: Label)
        -> TrainingStatus;

    /// Force a training pass over whatever is buffered for `subject`.
    fn train_batch(&self, subject: &str) -> TrainingStatus;

    /// Per-feature importance, empty when unknown.
    fn feature_importance(&self, subject: &str) -> Vec<f32>;

    fn phase(&self, subject: &str) -> LearningPhase;

    /// Buffered example count per subject.
    fn buffered_counts(&self) -> HashMap<String, usize>;

    /// Serialize current state, one snapshot per file.
    fn snapshot(&self, now_millis: i64) -> TacticsResult<Vec<(&'static str, ModelSnapshot)>>;

    /// Replace state for `file_name` from a decoded snapshot.
    fn restore(&self, file_name: &str, snapshot: &ModelSnapshot) -> TacticsResult<()>;

    /// Write every snapshot into `dir`. Returns the written paths.
    fn save(&self, dir: &Path, now_millis: i64) -> TacticsResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (file_name, snapshot) in self.snapshot(now_millis)? {
            let path = dir.join(file_name);
            std::fs::write(&path, snapshot.encode()).map_err(|e| StorageError::io(&path, &e))?;
            written.push(path);
        }
        Ok(written)
    }

    /// Restore from every file present in `dir`. Missing files are skipped.
    /// Returns how many files were restored.
    fn load(&self, dir: &Path) -> TacticsResult<usize> {
        let mut restored = 0;
        for file_name in self.file_names() {
            let path = dir.join(file_name);
            if !path.exists() {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|e| StorageError::io(&path, &e))?;
            let snapshot = ModelSnapshot::decode(&bytes).map_err(|e| match e {
                StorageError::MalformedSnapshot { details } => StorageError::CorruptSnapshot {
                    path: path.display().to_string(),
                    details,
                },
                other => other,
            })?;
            self.restore(file_name, &snapshot)?;
            restored += 1;
        }
        Ok(restored)
    }
}
