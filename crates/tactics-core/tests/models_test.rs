use tactics_core::models::*;

#[test]
fn label_action_defaults_to_unit_value() {
    let label = Label::Action(3);
    assert_eq!(label.action(), 3);
    assert_eq!(label.value(), 1.0);
    assert!(label.is_positive());
}

#[test]
fn negative_reward_is_not_positive() {
    let label = Label::Reward {
        action: 2,
        value: -0.5,
    };
    assert_eq!(label.action(), 2);
    assert!(!label.is_positive());
}

#[test]
fn label_serializes_snake_case() {
    let json = serde_json::to_string(&Label::Reward {
        action: 1,
        value: 0.25,
    })
    .unwrap();
    assert!(json.contains("reward"));
}

#[test]
fn feature_vector_is_transparent_in_json() {
    let fv = FeatureVector::new(vec![0.5, 1.0]);
    assert_eq!(serde_json::to_string(&fv).unwrap(), "[0.5,1.0]");
    assert_eq!(fv.get(1), Some(1.0));
    assert_eq!(fv.get(2), None);
}

#[test]
fn situation_defaults_are_neutral() {
    let s = Situation::new("zombie");
    assert_eq!(s.subject_type, "zombie");
    assert_eq!(s.self_health, 20.0);
    assert!(s.opponent_armor.is_none());
}

#[test]
fn situation_deserializes_without_optional_fields() {
    let s: Situation = serde_json::from_str(
        r#"{"subject_type":"spider","self_health":10.0,"opponent_health":5.0,
            "distance":2.0,"environment":1,"time_of_day":14000,"ally_count":0,
            "difficulty":2.0}"#,
    )
    .unwrap();
    assert!(s.opponent_weapon_damage.is_none());
    assert_eq!(s.time_of_day, 14000);
}

#[test]
fn backend_component_names_are_stable() {
    assert_eq!(
        BackendKind::FunctionApproximator.component(),
        "function_approximator"
    );
    assert_eq!(BackendKind::GradientBoosting.to_string(), "gradient_boosting");
    assert_eq!(BackendKind::RandomForest.component(), "random_forest");
}

#[test]
fn aggregate_status_round_trips_through_camel_case_payload() {
    let status = AggregateStatus {
        round: 4,
        contributors: 12,
        models_in_round: 9,
        has_global_model: true,
    };
    let payload = status.to_payload();
    assert!(payload.contains_key("modelsInRound"));
    assert!(payload.contains_key("hasGlobalModel"));
    assert_eq!(AggregateStatus::from_payload(&payload), Some(status));
}

#[test]
fn only_trained_status_reports_trained() {
    assert!(TrainingStatus::Trained { examples: 5 }.is_trained());
    assert!(!TrainingStatus::Busy.is_trained());
    assert!(!TrainingStatus::Buffered { buffered: 1 }.is_trained());
}
