/// Remote synchronization errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("remote call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("remote rejected request with status {status}: {reason}")]
    RemoteRejected { status: u16, reason: String },

    #[error("compression failed: {reason}")]
    Compression { reason: String },

    #[error("remote sync is disabled")]
    Disabled,
}

impl SyncError {
    /// Whether the next periodic cycle should simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Network { .. }
                | SyncError::Timeout { .. }
                | SyncError::RemoteRejected {
                    status: 500..=599,
                    ..
                }
        )
    }
}
