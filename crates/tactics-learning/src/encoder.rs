//! Situation → fixed-layout feature vector.

use tactics_core::constants::{
    ENCODER_VERSION, FEATURE_DIMENSION, HEALTH_RATIO_EPSILON, TICKS_PER_DAY,
};
use tactics_core::{FeatureVector, Situation};

const CLOSE_RANGE: f32 = 3.0;
const NIGHT_START: u32 = 13_000;
const NIGHT_END: u32 = 23_000;
const HEAVY_ARMOR: f32 = 15.0;

const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "self_health",
    "opponent_health",
    "distance",
    "environment",
    "time_of_day",
    "ally_count",
    "difficulty",
    "health_ratio",
    "close_range",
    "night",
    "has_backup",
    "subject_type",
    "opponent_armor",
    "opponent_weapon_damage",
    "armored_opponent",
];

/// Pure, deterministic encoder shared by every backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub const VERSION: u32 = ENCODER_VERSION;

    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, s: &Situation) -> FeatureVector {
        let armor = s.opponent_armor.unwrap_or(0.0);
        let weapon = s.opponent_weapon_damage.unwrap_or(0.0);
        let time = (s.time_of_day as f32 / TICKS_PER_DAY as f32).clamp(0.0, 1.0);

        FeatureVector::new(vec![
            s.self_health,
            s.opponent_health,
            s.distance,
            s.environment as f32,
            time,
            s.ally_count as f32,
            s.difficulty,
            s.self_health / (s.opponent_health + HEALTH_RATIO_EPSILON),
            flag(s.distance < CLOSE_RANGE),
            flag(s.time_of_day > NIGHT_START && s.time_of_day < NIGHT_END),
            flag(s.ally_count > 0),
            Self::subject_ordinal(&s.subject_type),
            armor,
            weapon,
            flag(armor > HEAVY_ARMOR),
        ])
    }

    pub fn dimension(&self) -> usize {
        FEATURE_DIMENSION
    }

    /// Names by position, for explainability.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    /// Case-insensitive ordinal for known subject types; 0 for anything else.
    pub fn subject_ordinal(subject_type: &str) -> f32 {
        match subject_type.to_ascii_lowercase().as_str() {
            "zombie" => 1.0,
            "skeleton" => 2.0,
            "spider" => 3.0,
            "creeper" => 4.0,
            "enderman" => 5.0,
            "witch" => 6.0,
            "pillager" => 7.0,
            _ => 0.0,
        }
    }
}

fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}
