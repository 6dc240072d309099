/// Exercise the default save/load methods on PredictorBackend with a mock.
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tactics_core::errors::{StorageError, TacticsError, TacticsResult};
use tactics_core::models::*;
use tactics_core::traits::*;

#[derive(Default)]
struct MockBackend {
    restored: Mutex<Vec<(String, Vec<u8>)>>,
}

impl PredictorBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GradientBoosting
    }
    fn file_names(&self) -> &'static [&'static str] {
        &["mock.model"]
    }
    fn is_available(&self) -> bool {
        true
    }
    fn predict(&self, _: &str, _: &FeatureVector) -> Option<usize> {
        None
    }
    fn record_outcome(&self, _: &str, _: FeatureVector, _: Label) -> TrainingStatus {
        TrainingStatus::Ignored
    }
    fn train_batch(&self, _: &str) -> TrainingStatus {
        TrainingStatus::Skipped {
            buffered: 0,
            needed: 1,
        }
    }
    fn feature_importance(&self, _: &str) -> Vec<f32> {
        vec![]
    }
    fn phase(&self, _: &str) -> LearningPhase {
        LearningPhase::Cold
    }
    fn buffered_counts(&self) -> HashMap<String, usize> {
        HashMap::new()
    }
    fn snapshot(&self, now: i64) -> TacticsResult<Vec<(&'static str, ModelSnapshot)>> {
        Ok(vec![(
            "mock.model",
            ModelSnapshot::new(self.component(), now, vec![9, 8, 7]),
        )])
    }
    fn restore(&self, file_name: &str, snapshot: &ModelSnapshot) -> TacticsResult<()> {
        self.restored
            .lock()
            .unwrap()
            .push((file_name.to_string(), snapshot.payload.clone()));
        Ok(())
    }
}

#[test]
fn default_save_then_load_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::default();
    let written = backend.save(dir.path(), 123).unwrap();
    assert_eq!(written.len(), 1);
    assert!(dir.path().join("mock.model").exists());

    assert_eq!(backend.load(dir.path()).unwrap(), 1);
    let restored = backend.restored.lock().unwrap();
    assert_eq!(restored[0], ("mock.model".to_string(), vec![9, 8, 7]));
}

#[test]
fn load_from_empty_dir_restores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(MockBackend::default().load(dir.path()).unwrap(), 0);
}

#[test]
fn load_reports_corrupt_file_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mock.model"), b"garbage").unwrap();
    let err = MockBackend::default().load(dir.path()).unwrap_err();
    match err {
        TacticsError::Storage(StorageError::CorruptSnapshot { path, .. }) => {
            assert!(path.ends_with("mock.model"))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn manual_clock_moves_only_when_told() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_millis(), 1_000);
    clock.advance(Duration::from_secs(2));
    assert_eq!(clock.now_millis(), 3_000);
    clock.set(10);
    assert_eq!(clock.now_millis(), 10);
}

#[test]
fn system_clock_is_after_2020() {
    assert!(SystemClock.now_millis() > 1_577_836_800_000);
}
