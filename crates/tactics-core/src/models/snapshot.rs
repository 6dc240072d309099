//! Versioned, checksummed snapshot envelope.
//!
//! Layout (little endian):
//! magic `TACS` · format version u16 · component length u32 + UTF-8 ·
//! last_save_millis i64 · payload length u64 + payload · blake3 of all
//! preceding bytes (32).

use crate::constants::{SNAPSHOT_FORMAT_VERSION, SNAPSHOT_MAGIC};
use crate::errors::StorageError;

use super::binary::{ByteReader, ByteWriter};

const CHECKSUM_LEN: usize = 32;

/// Serialized backend state plus metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSnapshot {
    pub component: String,
    pub last_save_millis: i64,
    pub format_version: u16,
    pub payload: Vec<u8>,
}

impl ModelSnapshot {
    pub fn new(component: impl Into<String>, last_save_millis: i64, payload: Vec<u8>) -> Self {
        Self {
            component: component.into(),
            last_save_millis,
            format_version: SNAPSHOT_FORMAT_VERSION,
            payload,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let name = self.component.as_bytes();
        let mut w = ByteWriter::with_capacity(
            SNAPSHOT_MAGIC.len() + 2 + 4 + name.len() + 8 + 8 + self.payload.len() + CHECKSUM_LEN,
        );
        w.put_bytes(&SNAPSHOT_MAGIC);
        w.put_u16(self.format_version);
        w.put_u32(name.len() as u32);
        w.put_bytes(name);
        w.put_i64(self.last_save_millis);
        w.put_u64(self.payload.len() as u64);
        w.put_bytes(&self.payload);
        let checksum = blake3::hash(w.as_slice());
        w.put_bytes(checksum.as_bytes());
        w.into_inner()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() < SNAPSHOT_MAGIC.len() + CHECKSUM_LEN {
            return Err(StorageError::malformed(format!(
                "{} bytes is too short for a snapshot",
                bytes.len()
            )));
        }
        let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        if blake3::hash(body).as_bytes() != checksum {
            return Err(StorageError::malformed("checksum mismatch"));
        }

        let mut r = ByteReader::new(body);
        if r.take(SNAPSHOT_MAGIC.len())? != SNAPSHOT_MAGIC {
            return Err(StorageError::malformed("bad magic"));
        }
        let format_version = r.u16()?;
        if format_version == 0 || format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(StorageError::malformed(format!(
                "unsupported format version {format_version} (max {SNAPSHOT_FORMAT_VERSION})"
            )));
        }
        let name_len = r.u32()? as usize;
        let component = std::str::from_utf8(r.take(name_len)?)
            .map_err(|e| StorageError::malformed(format!("component name: {e}")))?
            .to_string();
        let last_save_millis = r.i64()?;
        let payload_len = usize::try_from(r.u64()?)
            .map_err(|_| StorageError::malformed("payload length overflows usize"))?;
        let payload = r.take(payload_len)?.to_vec();
        r.finish()?;

        Ok(Self {
            component,
            last_save_millis,
            format_version,
            payload,
        })
    }
}
