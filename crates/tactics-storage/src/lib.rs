//! # tactics-storage
//!
//! Model persistence under a discovered root directory:
//! atomic temp-dir-then-rename saves, timestamped backups pruned to a fixed
//! count, corruption recovery (delete and start fresh), restore from the
//! latest backup, and a flat `key=value` metadata file.

pub mod discovery;
pub mod metadata;
pub mod store;

pub use discovery::{locate_root, locate_root_in};
pub use metadata::MetadataFile;
pub use store::{BackupInfo, ModelStore, SaveReport};
