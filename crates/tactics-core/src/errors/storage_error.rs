use std::path::Path;

/// Model persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("malformed snapshot: {details}")]
    MalformedSnapshot { details: String },

    #[error("corrupt snapshot at {path}: {details}")]
    CorruptSnapshot { path: String, details: String },

    #[error("load of {component} failed, starting fresh: {reason}")]
    LoadFailedStartFresh { component: String, reason: String },

    #[error("cannot create storage directory {path}: {reason}")]
    DirectoryUnavailable { path: String, reason: String },
}

impl StorageError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        StorageError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Shorthand for a malformed snapshot.
    pub fn malformed(details: impl Into<String>) -> Self {
        StorageError::MalformedSnapshot {
            details: details.into(),
        }
    }
}
