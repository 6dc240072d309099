use serde::{Deserialize, Serialize};

use super::defaults;

/// Activity gating configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Subjects idle longer than this are skipped.
    pub inactivity_threshold_secs: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold_secs: defaults::DEFAULT_INACTIVITY_THRESHOLD_SECS,
        }
    }
}

/// Scheduling of the periodic persist/sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub autosave_interval_ticks: u64,
    /// Upper bound on one background cycle; on expiry the cycle is abandoned.
    pub cycle_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            autosave_interval_ticks: defaults::DEFAULT_AUTOSAVE_INTERVAL_TICKS,
            cycle_timeout_secs: defaults::DEFAULT_CYCLE_TIMEOUT_SECS,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
