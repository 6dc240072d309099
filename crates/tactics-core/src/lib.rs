//! # tactics-core
//!
//! Foundation crate for the adaptive tactics core.
//! Defines the data model, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::TacticsConfig;
pub use errors::{TacticsError, TacticsResult};
pub use models::{
    BackendKind, FeatureVector, Label, LearningPhase, ModelSnapshot, Situation, TrainingExample,
    TrainingStatus,
};
pub use traits::{Clock, ManualClock, PredictorBackend, SystemClock};
