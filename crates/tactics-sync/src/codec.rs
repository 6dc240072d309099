//! Conditional gzip for outbound payloads.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tactics_core::config::defaults::DEFAULT_COMPRESSION_THRESHOLD_BYTES;
use tactics_core::errors::SyncError;
use tracing::{debug, warn};

/// Body ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub bytes: Vec<u8>,
    pub compressed: bool,
    pub original_len: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompressionStats {
    /// Payloads passed to `encode`.
    pub encoded: u64,
    /// Of those, how many went out compressed.
    pub compressed: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl CompressionStats {
    /// Output over input bytes; 1.0 before anything was encoded.
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            1.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64
        }
    }
}

#[derive(Debug)]
pub struct PayloadCodec {
    threshold: usize,
    encoded: AtomicU64,
    compressed: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
}

impl Default for PayloadCodec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_THRESHOLD_BYTES)
    }
}

impl PayloadCodec {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            encoded: AtomicU64::new(0),
            compressed: AtomicU64::new(0),
            bytes_in: AtomicU64::new(0),
            bytes_out: AtomicU64::new(0),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn should_compress(&self, text: &str) -> bool {
        text.len() >= self.threshold
    }

    /// Gzip `text`. `None` below the threshold, when the output is not
    /// strictly smaller than the input, or when the encoder fails.
    pub fn compress(&self, text: &str) -> Option<Vec<u8>> {
        if !self.should_compress(text) {
            return None;
        }
        let mut encoder = GzEncoder::new(Vec::with_capacity(text.len() / 2), Compression::default());
        let out = match encoder.write_all(text.as_bytes()).and_then(|_| encoder.finish()) {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "compression failed");
                return None;
            }
        };
        if out.len() >= text.len() {
            debug!(original = text.len(), compressed = out.len(), "compression did not shrink payload");
            return None;
        }
        Some(out)
    }

    pub fn decompress(&self, bytes: &[u8]) -> Result<String, SyncError> {
        let mut text = String::new();
        GzDecoder::new(bytes)
            .read_to_string(&mut text)
            .map_err(|e| SyncError::Compression {
                reason: e.to_string(),
            })?;
        Ok(text)
    }

    /// Compressed when that pays off, the raw UTF-8 bytes otherwise.
    pub fn encode(&self, text: &str) -> EncodedPayload {
        let (bytes, compressed) = match self.compress(text) {
            Some(bytes) => (bytes, true),
            None => (text.as_bytes().to_vec(), false),
        };
        self.encoded.fetch_add(1, Ordering::Relaxed);
        if compressed {
            self.compressed.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_in.fetch_add(text.len() as u64, Ordering::Relaxed);
        self.bytes_out.fetch_add(bytes.len() as u64, Ordering::Relaxed);
        EncodedPayload {
            bytes,
            compressed,
            original_len: text.len(),
        }
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(&self, payload: &EncodedPayload) -> Result<String, SyncError> {
        if payload.compressed {
            self.decompress(&payload.bytes)
        } else {
            String::from_utf8(payload.bytes.clone()).map_err(|e| SyncError::Compression {
                reason: e.to_string(),
            })
        }
    }

    pub fn stats(&self) -> CompressionStats {
        CompressionStats {
            encoded: self.encoded.load(Ordering::Relaxed),
            compressed: self.compressed.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let codec = PayloadCodec::new(4);
        assert!(!codec.should_compress("abc"));
        assert!(codec.should_compress("abcd"));
    }

    #[test]
    fn garbage_does_not_decompress() {
        let codec = PayloadCodec::default();
        assert!(matches!(
            codec.decompress(b"plainly not gzip"),
            Err(SyncError::Compression { .. })
        ));
    }
}
