//! Subscriber setup and span constructors for learning, persistence, and sync.

use tactics_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. `RUST_LOG` wins over the configured
/// level. Returns false when a subscriber was already installed.
pub fn init(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

/// Create a learning span.
#[macro_export]
macro_rules! learning_span {
    ($subject_type:expr) => {
        tracing::info_span!("tactics.learning", subject_type = %$subject_type)
    };
}

/// Create a persistence span.
#[macro_export]
macro_rules! persist_span {
    ($dirty:expr) => {
        tracing::info_span!("tactics.persist", dirty = $dirty)
    };
}

/// Create a sync span.
#[macro_export]
macro_rules! sync_span {
    ($dirty:expr) => {
        tracing::info_span!("tactics.sync", dirty = $dirty)
    };
}
