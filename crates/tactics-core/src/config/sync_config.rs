use serde::{Deserialize, Serialize};

use super::defaults;

/// Remote aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    /// Base URL of the aggregation service.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// How long fetched aggregate data is served from cache.
    pub cache_ttl_secs: u64,
    pub cache_max_entries: u64,
    /// Payloads smaller than this are sent uncompressed.
    pub compression_threshold_bytes: usize,
    /// Download the global model after a successful upload.
    pub pull_global_model: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            api_key: None,
            request_timeout_secs: defaults::DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
            cache_max_entries: defaults::DEFAULT_CACHE_MAX_ENTRIES,
            compression_threshold_bytes: defaults::DEFAULT_COMPRESSION_THRESHOLD_BYTES,
            pull_global_model: false,
        }
    }
}
