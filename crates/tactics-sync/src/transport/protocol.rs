//! Wire types. The aggregator owns its schema; this side only promises a
//! versioned JSON delta document (optionally gzipped) and reads back the
//! round status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tactics_core::errors::SyncError;
use tactics_core::models::AggregateStatus;

use crate::codec::EncodedPayload;

/// Current delta document version.
pub const PROTOCOL_VERSION: &str = "1.0";

pub const UPLOAD_PATH: &str = "/api/upload";
pub const STATUS_PATH: &str = "/api/status";
pub const GLOBAL_MODEL_PATH: &str = "/api/global-model";

/// What one subject contributes to an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDelta {
    pub subject: String,
    /// Parts of the subject that changed, when known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_keys: Vec<String>,
    pub data: serde_json::Value,
}

/// The JSON document that gets encoded and uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaDocument {
    pub version: String,
    pub client_id: String,
    pub generated_at: DateTime<Utc>,
    pub subjects: Vec<SubjectDelta>,
}

impl DeltaDocument {
    pub fn new(client_id: impl Into<String>, subjects: Vec<SubjectDelta>) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            client_id: client_id.into(),
            generated_at: Utc::now(),
            subjects,
        }
    }
}

/// One upload request: the encoded body plus envelope fields that travel as
/// headers.
#[derive(Debug, Clone)]
pub struct ModelUpload {
    pub request_id: String,
    pub client_id: String,
    pub subjects: Vec<String>,
    pub body: Vec<u8>,
    pub compressed: bool,
    pub original_len: usize,
}

impl ModelUpload {
    pub fn new(client_id: impl Into<String>, subjects: Vec<String>, payload: EncodedPayload) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            subjects,
            body: payload.bytes,
            compressed: payload.compressed,
            original_len: payload.original_len,
        }
    }
}

/// Parse an aggregator status body. Unknown fields are ignored and missing
/// ones default.
pub fn parse_status(body: &[u8]) -> Result<AggregateStatus, SyncError> {
    serde_json::from_slice(body).map_err(|e| SyncError::Network {
        reason: format!("unreadable status response: {e}"),
    })
}
