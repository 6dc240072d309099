//! Typed configuration. Every section is `#[serde(default)]`, so a partial
//! (or empty) TOML document yields a complete config.

pub mod defaults;
mod learning_config;
mod runtime_config;
mod storage_config;
mod sync_config;

pub use learning_config::{BoostingConfig, ForestConfig, LearningConfig};
pub use runtime_config::{ActivityConfig, ObservabilityConfig, RuntimeConfig};
pub use storage_config::StorageConfig;
pub use sync_config::SyncConfig;

use serde::{Deserialize, Serialize};

/// Root configuration for the tactics core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsConfig {
    pub learning: LearningConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub activity: ActivityConfig,
    pub runtime: RuntimeConfig,
    pub observability: ObservabilityConfig,
}

impl TacticsConfig {
    /// Parse a TOML document the host has already read.
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}
