//! Aggregator transport: the trait the engine talks to, the wire types, and
//! (with the `remote` feature) a blocking HTTP implementation.

#[cfg(feature = "remote")]
mod http;
pub mod protocol;

use tactics_core::errors::SyncError;
use tactics_core::models::AggregateStatus;

#[cfg(feature = "remote")]
pub use http::HttpTransport;
pub use protocol::ModelUpload;

/// Blob in, status out. Implementations block; callers run them off the
/// tick thread.
pub trait AggregatorTransport: Send + Sync {
    /// Send a delta. The response carries the aggregator's round status.
    fn upload(&self, upload: &ModelUpload) -> Result<AggregateStatus, SyncError>;

    fn fetch_status(&self) -> Result<AggregateStatus, SyncError>;

    /// `None` when the aggregator has no global model yet.
    fn download_global_model(&self) -> Result<Option<Vec<u8>>, SyncError>;
}
