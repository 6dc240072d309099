use std::sync::Arc;

use tactics_core::config::{BoostingConfig, LearningConfig};
use tactics_core::{BackendKind, Label, LearningPhase, PredictorBackend, Situation, TrainingStatus};
use tactics_learning::{
    FunctionApproximator, GradientBoostingBackend, LearningEngine, RandomForestBackend,
};

fn config() -> LearningConfig {
    LearningConfig {
        seed: Some(3),
        approximator_batch_size: 1_000,
        boosting: BoostingConfig {
            batch_size: 20,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn situation(distance: f32) -> Situation {
    let mut s = Situation::new("zombie");
    s.distance = distance;
    s
}

fn teach(engine: &LearningEngine, n: usize) {
    for i in 0..n {
        let close = i % 2 == 0;
        let s = situation(if close { 1.5 } else { 10.0 });
        let features = engine.encoder().encode(&s);
        let action = if close { 2 } else { 6 };
        engine.record_outcome("zombie", &features, Label::Reward { action, value: 1.0 });
        engine.record_outcome(
            "zombie",
            &features,
            Label::Reward {
                action: 8 - action,
                value: -1.0,
            },
        );
    }
}

#[test]
fn nothing_trained_means_no_decision() {
    let engine = LearningEngine::new(&config());
    assert!(engine.decide("zombie", &situation(2.0)).is_none());
    assert!(engine.feature_ranking("zombie", 3).is_empty());
}

#[test]
fn decision_falls_back_past_untrained_approximator() {
    let engine = LearningEngine::new(&config());
    teach(&engine, 10);

    let phases = engine.phases("zombie");
    assert_eq!(phases[0], (BackendKind::FunctionApproximator, LearningPhase::Buffering));
    assert_eq!(phases[1], (BackendKind::GradientBoosting, LearningPhase::Trained));

    let decision = engine.decide("zombie", &situation(1.5)).unwrap();
    assert_eq!(decision.backend, BackendKind::GradientBoosting);
    assert_eq!(decision.action, 2);
    assert_eq!(decision.features.len(), 15);

    let far = engine.decide("zombie", &situation(10.0)).unwrap();
    assert_eq!(far.action, 6);
}

#[test]
fn priority_order_follows_config_and_drops_duplicates() {
    let engine = LearningEngine::new(&LearningConfig {
        backend_priority: vec![
            BackendKind::RandomForest,
            BackendKind::GradientBoosting,
            BackendKind::RandomForest,
        ],
        ..config()
    });
    let kinds: Vec<BackendKind> = engine.backends().iter().map(|b| b.kind()).collect();
    assert_eq!(kinds, vec![BackendKind::RandomForest, BackendKind::GradientBoosting]);
    assert!(engine.backend(BackendKind::FunctionApproximator).is_none());
}

#[test]
fn outcomes_skip_unavailable_backends_but_reach_knowledge() {
    let cfg = config();
    let engine = LearningEngine::with_backends(vec![
        Arc::new(FunctionApproximator::new(&cfg)) as Arc<dyn PredictorBackend>,
        Arc::new(GradientBoostingBackend::unavailable(&cfg)),
        Arc::new(RandomForestBackend::unavailable(&cfg)),
    ]);
    let features = engine.encoder().encode(&situation(4.0));
    let statuses = engine.record_outcome("spider", &features, Label::Action(1));
    assert_eq!(
        statuses,
        vec![(
            BackendKind::FunctionApproximator,
            TrainingStatus::Buffered { buffered: 1 }
        )]
    );
    assert_eq!(engine.knowledge().success_rate("spider", 1), Some(1.0));
}

#[test]
fn feature_ranking_names_the_range_features() {
    let engine = LearningEngine::new(&config());
    teach(&engine, 10);
    let ranking = engine.feature_ranking("zombie", 2);
    assert_eq!(ranking.len(), 2);
    assert!(ranking[0].importance >= ranking[1].importance);
    assert!(["distance", "close_range"].contains(&ranking[0].name));
}

#[test]
fn train_all_reports_every_available_backend() {
    let engine = LearningEngine::new(&config());
    teach(&engine, 3);
    let statuses = engine.train_all("zombie");
    assert_eq!(statuses.len(), 3);
    assert!(statuses.iter().all(|(_, s)| !matches!(s, TrainingStatus::Unavailable)));
}
