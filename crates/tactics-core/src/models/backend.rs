use serde::{Deserialize, Serialize};

/// The available learner implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    FunctionApproximator,
    GradientBoosting,
    RandomForest,
}

impl BackendKind {
    /// Stable component name used in metadata and snapshots.
    pub fn component(&self) -> &'static str {
        match self {
            BackendKind::FunctionApproximator => "function_approximator",
            BackendKind::GradientBoosting => "gradient_boosting",
            BackendKind::RandomForest => "random_forest",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.component())
    }
}

/// Per subject type, per backend lifecycle.
///
/// `Cold → Buffering → Trained → Buffering → …`; `Trained` is never terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningPhase {
    /// No buffer, no model.
    Cold,
    /// Examples accumulating, no model fit yet.
    Buffering,
    /// A model has been fit at least once.
    Trained,
}

/// What happened to a recorded outcome or a training request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    /// Backend is not available; nothing was done.
    Unavailable,
    /// Example buffered, threshold not reached yet.
    Buffered { buffered: usize },
    /// A training pass ran over `examples` examples.
    Trained { examples: usize },
    /// Not enough data to fit; keep buffering.
    Skipped { buffered: usize, needed: usize },
    /// Another training run for the same subject is in flight.
    Busy,
    /// The example does not apply to this backend.
    Ignored,
    /// Training failed for this subject only.
    Failed { reason: String },
}

impl TrainingStatus {
    pub fn is_trained(&self) -> bool {
        matches!(self, TrainingStatus::Trained { .. })
    }
}
