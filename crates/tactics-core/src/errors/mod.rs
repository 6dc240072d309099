//! Error hierarchy. Each subsystem has its own enum; [`TacticsError`] unifies them.

mod learning_error;
mod storage_error;
mod sync_error;

pub use learning_error::LearningError;
pub use storage_error::StorageError;
pub use sync_error::SyncError;

/// Result alias used across the workspace.
pub type TacticsResult<T> = Result<T, TacticsError>;

/// Top-level error for the tactics core.
#[derive(Debug, thiserror::Error)]
pub enum TacticsError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("learning error: {0}")]
    Learning(#[from] LearningError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TacticsError {
    /// Whether the caller should continue with a freshly initialized backend.
    pub fn is_start_fresh(&self) -> bool {
        matches!(
            self,
            TacticsError::Storage(StorageError::LoadFailedStartFresh { .. })
        )
    }

    /// Whether this error must stop the runtime from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TacticsError::Storage(StorageError::DirectoryUnavailable { .. })
        )
    }
}

impl From<serde_json::Error> for TacticsError {
    fn from(err: serde_json::Error) -> Self {
        TacticsError::Serialization(err.to_string())
    }
}
