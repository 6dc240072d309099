/// Learning subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum LearningError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("insufficient examples: need {needed}, have {available}")]
    InsufficientExamples { needed: usize, available: usize },

    #[error("backend unavailable: {backend}")]
    BackendUnavailable { backend: String },

    #[error("action {action} out of range for {num_actions} actions")]
    InvalidAction { action: usize, num_actions: usize },

    #[error("cannot decode {backend} model: {reason}")]
    ModelDecode { backend: String, reason: String },
}
