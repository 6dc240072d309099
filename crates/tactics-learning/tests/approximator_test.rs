use tactics_core::config::LearningConfig;
use tactics_core::{FeatureVector, Label, LearningPhase, PredictorBackend, TrainingStatus};
use tactics_learning::FunctionApproximator;

fn config(target_sync_interval: u32) -> LearningConfig {
    LearningConfig {
        hidden_size: 16,
        learning_rate: 0.05,
        approximator_batch_size: 8,
        min_training_examples: 4,
        target_sync_interval,
        seed: Some(11),
        ..Default::default()
    }
}

fn features() -> FeatureVector {
    FeatureVector::new(vec![0.1; 15])
}

#[test]
fn untrained_approximator_defers_to_other_backends() {
    let approx = FunctionApproximator::new(&config(10));
    assert_eq!(approx.predict("zombie", &features()), None);
    assert_eq!(approx.phase("zombie"), LearningPhase::Cold);
    assert!(approx.feature_importance("zombie").is_empty());
}

#[test]
fn buffer_fill_triggers_a_batch_and_retains_half() {
    let approx = FunctionApproximator::new(&config(10));
    for i in 0..7 {
        let status = approx.record_outcome("zombie", features(), Label::Action(3));
        assert_eq!(status, TrainingStatus::Buffered { buffered: i + 1 });
    }
    assert_eq!(approx.phase("zombie"), LearningPhase::Buffering);

    let status = approx.record_outcome("zombie", features(), Label::Action(3));
    assert_eq!(status, TrainingStatus::Trained { examples: 8 });
    assert_eq!(approx.buffered_counts()["zombie"], 4);
    assert_eq!(approx.phase("zombie"), LearningPhase::Trained);
    assert_eq!(approx.feature_importance("zombie").len(), 15);
}

#[test]
fn repeated_one_hot_targets_drive_the_prediction() {
    let approx = FunctionApproximator::new(&config(2));
    for _ in 0..200 {
        approx.record_outcome("skeleton", features(), Label::Action(3));
    }
    assert_eq!(approx.predict("skeleton", &features()), Some(3));
}

#[test]
fn too_few_examples_skips_training() {
    let approx = FunctionApproximator::new(&config(10));
    approx.record_outcome("spider", features(), Label::Action(1));
    assert_eq!(
        approx.train_batch("spider"),
        TrainingStatus::Skipped {
            buffered: 1,
            needed: 4
        }
    );
    assert_eq!(
        approx.train_batch("nobody"),
        TrainingStatus::Skipped {
            buffered: 0,
            needed: 4
        }
    );
}

#[test]
fn target_network_follows_policy_only_at_sync_interval() {
    let synced_every_batch = FunctionApproximator::new(&config(1));
    let lagging = FunctionApproximator::new(&config(10));
    for _ in 0..8 {
        synced_every_batch.record_outcome("zombie", features(), Label::Action(0));
        lagging.record_outcome("zombie", features(), Label::Action(0));
    }
    assert_eq!(
        synced_every_batch.policy_network(),
        synced_every_batch.target_network()
    );
    assert_ne!(lagging.policy_network(), lagging.target_network());
}

#[test]
fn reward_labels_only_move_the_rewarded_action() {
    let approx = FunctionApproximator::new(&config(10));
    let before = approx.scores(&features()).unwrap();
    for _ in 0..8 {
        approx.record_outcome(
            "creeper",
            features(),
            Label::Reward {
                action: 5,
                value: before[5] + 2.0,
            },
        );
    }
    let after = approx.scores(&features()).unwrap();
    assert!(after[5] > before[5]);
}

#[test]
fn save_and_load_round_trip_within_tolerance() {
    let dir = tempfile::tempdir().unwrap();
    let trained = FunctionApproximator::new(&config(3));
    for i in 0..24 {
        trained.record_outcome("zombie", features(), Label::Action(i % 4));
    }
    let written = trained.save(dir.path(), 1_000).unwrap();
    assert_eq!(written.len(), 2);

    let fresh = FunctionApproximator::new(&LearningConfig {
        seed: Some(999),
        ..config(3)
    });
    assert_eq!(fresh.load(dir.path()).unwrap(), 2);

    let a = trained.scores(&features()).unwrap();
    let b = fresh.scores(&features()).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).abs() < 1e-5);
    }
    assert_eq!(fresh.policy_network(), trained.policy_network());
    assert_eq!(fresh.target_network(), trained.target_network());
    assert_eq!(fresh.phase("zombie"), LearningPhase::Trained);
}

#[test]
fn restore_rejects_a_network_of_the_wrong_shape() {
    let small = FunctionApproximator::new(&LearningConfig {
        num_actions: 3,
        ..config(10)
    });
    let snapshots = small.snapshot(1).unwrap();
    let normal = FunctionApproximator::new(&config(10));
    assert!(normal.restore(snapshots[0].0, &snapshots[0].1).is_err());
}
