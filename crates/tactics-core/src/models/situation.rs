use serde::{Deserialize, Serialize};

/// Snapshot of a live interaction, as handed over by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Situation {
    /// Kind of agent, e.g. `"zombie"`.
    pub subject_type: String,
    pub self_health: f32,
    pub opponent_health: f32,
    pub distance: f32,
    /// Ordinal id of the surrounding environment (biome).
    pub environment: u32,
    /// Time of day in ticks, `0..24000`.
    pub time_of_day: u32,
    pub ally_count: u32,
    pub difficulty: f32,
    #[serde(default)]
    pub opponent_armor: Option<f32>,
    #[serde(default)]
    pub opponent_weapon_damage: Option<f32>,
}

impl Situation {
    /// A neutral situation for the given subject type.
    pub fn new(subject_type: impl Into<String>) -> Self {
        Self {
            subject_type: subject_type.into(),
            self_health: 20.0,
            opponent_health: 20.0,
            distance: 8.0,
            environment: 0,
            time_of_day: 6_000,
            ally_count: 0,
            difficulty: 1.0,
            opponent_armor: None,
            opponent_weapon_damage: None,
        }
    }
}
