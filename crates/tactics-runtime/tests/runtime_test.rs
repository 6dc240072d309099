mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tactics_core::errors::TacticsError;
use tactics_core::{BackendKind, Label, LearningPhase, ManualClock, Situation};
use tactics_runtime::{RuntimeOptions, TacticsRuntime};
use tactics_sync::{AggregatorTransport, SyncOutcome};

use common::{options, runtime, CountingTransport};

fn teach(rt: &TacticsRuntime, subject_type: &str, outcomes: usize) {
    let features = rt.engine().encoder().encode(&Situation::new(subject_type));
    for i in 0..outcomes {
        rt.report_outcome(subject_type, &features, Label::Action(i % 2));
    }
}

#[test]
fn cold_runtime_has_no_opinion() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let rt = runtime(dir.path(), &clock);
    assert!(rt.decide("z-1", "zombie", &Situation::new("zombie")).is_none());
    assert_eq!(rt.config().learning.approximator_batch_size, 4);
}

#[test]
fn persist_then_reload_gives_the_same_decision() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let situation = Situation::new("zombie");

    let decision = {
        let rt = runtime(dir.path(), &clock);
        teach(&rt, "zombie", 8);
        assert!(rt.persist_tracker().is_dirty("zombie"));
        let decision = rt
            .decide("z-1", "zombie", &situation)
            .expect("approximator trained after a full batch");
        assert_eq!(decision.backend, BackendKind::FunctionApproximator);

        let report = rt.persist_cycle().unwrap();
        assert!(report.is_complete(), "{report:?}");
        assert!(report.saved.iter().any(|(c, _)| c == "tactic_knowledge"));
        assert!(!rt.persist_tracker().has_any_dirty());
        assert!(rt.upload_tracker().is_dirty("zombie"), "upload is tracked separately");
        decision
    };
    for file in [
        "policy.model",
        "target.model",
        "knowledge.dat",
        "model_metadata.properties",
    ] {
        assert!(dir.path().join(file).exists(), "{file} missing");
    }

    let reloaded = runtime(dir.path(), &clock);
    let again = reloaded.decide("z-1", "zombie", &situation).unwrap();
    assert_eq!(again.action, decision.action);
    assert_eq!(again.backend, decision.backend);
    let stats = reloaded.engine().knowledge().stats("zombie", 0).unwrap();
    assert_eq!(stats.attempts, 4);
    assert_eq!(
        reloaded.store().last_save("function_approximator"),
        Some(1_000)
    );
}

#[test]
fn clean_runtime_skips_the_save() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let rt = runtime(dir.path(), &clock);
    let report = rt.persist_cycle().unwrap();
    assert!(report.saved.is_empty());
    assert!(!dir.path().join("knowledge.dat").exists());
}

#[test]
fn backups_rotate_across_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let rt = runtime(dir.path(), &clock);
    for _ in 0..4 {
        teach(&rt, "skeleton", 2);
        rt.persist_cycle().unwrap();
        clock.advance(Duration::from_secs(1));
    }
    // The first cycle had nothing to back up.
    let backups = rt.store().list_backups().unwrap();
    assert_eq!(backups.len(), 2);
    assert_eq!(backups[0].created_millis, 2_000);
    assert_eq!(backups[1].created_millis, 3_000);
    assert_eq!(rt.stats().backups, 2);
}

#[test]
fn corrupt_model_on_disk_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    {
        let rt = runtime(dir.path(), &clock);
        teach(&rt, "zombie", 8);
        rt.shutdown().unwrap();
    }
    let policy = dir.path().join("policy.model");
    fs::write(&policy, b"TACS but not really").unwrap();

    let rt = runtime(dir.path(), &clock);
    assert!(!policy.exists());
    assert!(!dir.path().join("target.model").exists());
    let approximator = rt
        .engine()
        .backend(BackendKind::FunctionApproximator)
        .unwrap();
    assert_eq!(approximator.phase("zombie"), LearningPhase::Cold);
    let decision = rt.decide("z-1", "zombie", &Situation::new("zombie"));
    assert_ne!(
        decision.map(|d| d.backend),
        Some(BackendKind::FunctionApproximator)
    );
    // Other components load normally.
    assert!(rt.engine().knowledge().stats("zombie", 1).is_some());
}

#[test]
fn bad_config_and_bad_root_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = TacticsRuntime::new(
        RuntimeOptions::default()
            .with_root(dir.path())
            .with_config_toml("[learning\nhidden_size = 3"),
    )
    .unwrap_err();
    assert!(matches!(err, TacticsError::ConfigError(_)));

    let file = dir.path().join("occupied");
    fs::write(&file, b"x").unwrap();
    let err = TacticsRuntime::new(RuntimeOptions::default().with_root(file.join("models")))
        .unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn idle_subjects_are_not_decided_for() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let rt = runtime(dir.path(), &clock);
    teach(&rt, "zombie", 8);
    let situation = Situation::new("zombie");

    rt.record_activity("z-2");
    clock.advance(Duration::from_secs(61));
    assert!(rt.decide("z-2", "zombie", &situation).is_none());
    rt.record_activity("z-2");
    assert!(rt.decide("z-2", "zombie", &situation).is_some());
    assert_eq!(rt.stats().activity.skipped, 1);
}

#[test]
fn autosave_is_due_every_interval() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let rt = runtime(dir.path(), &clock);
    let due: Vec<bool> = (0..6).map(|_| rt.on_tick()).collect();
    assert_eq!(due, vec![false, false, true, false, false, true]);
    assert_eq!(rt.stats().ticks, 6);
}

#[test]
fn sync_cycle_uploads_and_cleans_upload_tracker() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(CountingTransport::default());
    let rt = TacticsRuntime::new(
        options(dir.path(), &clock)
            .with_transport(transport.clone() as Arc<dyn AggregatorTransport>),
    )
    .unwrap();

    assert_eq!(rt.sync_cycle(), SyncOutcome::NothingToSend);
    teach(&rt, "spider", 3);
    match rt.sync_cycle() {
        SyncOutcome::Uploaded { subjects, .. } => assert_eq!(subjects, vec!["spider"]),
        other => panic!("expected upload, got {other:?}"),
    }
    assert_eq!(transport.upload_count(), 1);
    assert!(!rt.upload_tracker().has_any_dirty());
    assert!(rt.persist_tracker().is_dirty("spider"));
    assert_eq!(rt.sync_engine().aggregate_status().unwrap().round, 1);
}

#[test]
fn run_cycle_without_remote_still_persists() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let rt = runtime(dir.path(), &clock);
    teach(&rt, "zombie", 2);
    let report = rt.run_cycle();
    assert_eq!(report.sync, SyncOutcome::Disabled);
    assert!(report.persist.unwrap().files_written() > 0);

    let stats = rt.stats();
    assert_eq!(stats.persist.dirty, 0);
    assert_eq!(stats.buffered["function_approximator"]["zombie"], 2);
    assert!(serde_json::to_string(&stats).unwrap().contains("\"ticks\":0"));
}
