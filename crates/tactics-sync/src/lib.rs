//! # tactics-sync
//!
//! Everything between "a model changed" and "the aggregator has it":
//!
//! - [`ChangeTracker`]: per-subject dirty flags with generations, so a flush
//!   only clears what it covered.
//! - [`RemoteCache`]: TTL cache for aggregator responses.
//! - [`PayloadCodec`]: gzip above a size threshold, never when it grows.
//! - [`ActivityGate`]: skips idle subjects, fail-open on first contact.
//! - [`SyncEngine`]: checkpoint, encode, upload, clean.
//!
//! The HTTP transport is behind the `remote` feature. Without it the engine
//! still runs against any [`AggregatorTransport`].

pub mod activity;
pub mod cache;
pub mod change_tracker;
pub mod codec;
pub mod engine;
pub mod transport;

pub use activity::{ActivityGate, ActivityStats};
pub use cache::{CacheStats, RemoteCache};
pub use change_tracker::{ChangeTracker, ChangeTrackerStats, DirtyToken};
pub use codec::{CompressionStats, EncodedPayload, PayloadCodec};
pub use engine::{DeltaSource, SyncEngine, SyncOutcome, SyncStats};
pub use transport::protocol::{DeltaDocument, ModelUpload, SubjectDelta, PROTOCOL_VERSION};
pub use transport::AggregatorTransport;
#[cfg(feature = "remote")]
pub use transport::HttpTransport;
