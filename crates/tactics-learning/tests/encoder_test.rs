use proptest::prelude::*;
use serde::Deserialize;
use tactics_core::constants::FEATURE_DIMENSION;
use tactics_core::Situation;
use tactics_learning::FeatureEncoder;

#[derive(Deserialize)]
struct EncoderGolden {
    encoder_version: u32,
    tolerance: f32,
    cases: Vec<EncoderCase>,
}

#[derive(Deserialize)]
struct EncoderCase {
    name: String,
    situation: Situation,
    expected: Vec<f32>,
}

#[test]
fn golden_situations_encode_to_expected_vectors() {
    let golden: EncoderGolden = test_fixtures::load_fixture("golden/encoder/situations.json");
    assert_eq!(golden.encoder_version, FeatureEncoder::VERSION);

    let encoder = FeatureEncoder::new();
    for case in &golden.cases {
        let got = encoder.encode(&case.situation);
        assert_eq!(got.len(), case.expected.len(), "{}", case.name);
        for (i, (g, e)) in got.iter().zip(&case.expected).enumerate() {
            assert!(
                (g - e).abs() <= golden.tolerance,
                "{} position {} ({}): got {}, expected {}",
                case.name,
                i,
                encoder.feature_names()[i],
                g,
                e
            );
        }
    }
}

#[test]
fn names_match_dimension() {
    let encoder = FeatureEncoder::new();
    assert_eq!(encoder.dimension(), FEATURE_DIMENSION);
    assert_eq!(encoder.feature_names().len(), FEATURE_DIMENSION);
    assert_eq!(encoder.feature_names()[7], "health_ratio");
}

#[test]
fn subject_ordinals_are_case_insensitive() {
    assert_eq!(FeatureEncoder::subject_ordinal("Creeper"), 4.0);
    assert_eq!(FeatureEncoder::subject_ordinal("ENDERMAN"), 5.0);
    assert_eq!(FeatureEncoder::subject_ordinal("witch"), 6.0);
    assert_eq!(FeatureEncoder::subject_ordinal("slime"), 0.0);
}

#[test]
fn night_window_is_exclusive_at_both_ends() {
    let encoder = FeatureEncoder::new();
    let mut s = Situation::new("zombie");
    for (ticks, night) in [(13_000, 0.0), (13_001, 1.0), (22_999, 1.0), (23_000, 0.0)] {
        s.time_of_day = ticks;
        assert_eq!(encoder.encode(&s).get(9), Some(night), "ticks {ticks}");
    }
}

proptest! {
    #[test]
    fn encoding_is_deterministic_and_well_formed(
        self_health in 0.0f32..40.0,
        opponent_health in 0.0f32..40.0,
        distance in 0.0f32..64.0,
        time_of_day in 0u32..48_000,
        ally_count in 0u32..8,
        armor in proptest::option::of(0.0f32..30.0),
    ) {
        let mut s = Situation::new("spider");
        s.self_health = self_health;
        s.opponent_health = opponent_health;
        s.distance = distance;
        s.time_of_day = time_of_day;
        s.ally_count = ally_count;
        s.opponent_armor = armor;

        let encoder = FeatureEncoder::new();
        let a = encoder.encode(&s);
        let b = encoder.encode(&s);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), FEATURE_DIMENSION);
        prop_assert!(a.iter().all(|v| v.is_finite()));
        let time = a.get(4).unwrap();
        prop_assert!((0.0..=1.0).contains(&time));
        for flag in [8, 9, 10, 14] {
            let v = a.get(flag).unwrap();
            prop_assert!(v == 0.0 || v == 1.0);
        }
    }
}
