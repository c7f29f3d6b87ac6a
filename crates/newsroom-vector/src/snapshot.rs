//! Snapshot layout:
//!
//! ```text
//! magic "NWIX" | version u16 LE | bincode body | blake3(body) 32 bytes
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use newsroom_core::{Chunk, Error, Result};

use crate::index::VectorIndex;

pub const SNAPSHOT_MAGIC: &[u8; 4] = b"NWIX";
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2;
const DIGEST_LEN: usize = 32;

#[derive(Serialize)]
struct BodyRef<'a> {
    dimension: Option<usize>,
    entries: Vec<(&'a Chunk, &'a [f32])>,
}

#[derive(Deserialize)]
struct Body {
    dimension: Option<usize>,
    entries: Vec<(Chunk, Vec<f32>)>,
}

impl VectorIndex {
    /// Serializes chunks, vectors and insertion order.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let body = BodyRef {
            dimension: self.dimension(),
            entries: self.entries.iter().map(|e| (&e.chunk, e.vector.as_slice())).collect(),
        };
        let body_bytes = bincode::serde::encode_to_vec(&body, bincode::config::standard())
            .map_err(|e| Error::CorruptSnapshot(format!("failed to encode index: {}", e)))?;

        let mut out = Vec::with_capacity(HEADER_LEN + body_bytes.len() + DIGEST_LEN);
        out.extend_from_slice(SNAPSHOT_MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&body_bytes);
        out.extend_from_slice(blake3::hash(&body_bytes).as_bytes());
        debug!(entries = self.len(), bytes = out.len(), "index snapshot written");
        Ok(out)
    }

    /// Rebuilds an index from [`VectorIndex::snapshot`] output.
    ///
    /// Fails with `DimensionMismatch` when the stored dimension differs from
    /// `expected_dimension`, and `CorruptSnapshot` on any framing, digest or
    /// decode problem.
    pub fn restore(bytes: &[u8], expected_dimension: usize) -> Result<Self> {
        if bytes.len() < HEADER_LEN + DIGEST_LEN {
            return Err(Error::CorruptSnapshot(format!("{} bytes is too short", bytes.len())));
        }
        if &bytes[0..4] != SNAPSHOT_MAGIC {
            return Err(Error::CorruptSnapshot("bad magic bytes".to_string()));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(Error::CorruptSnapshot(format!(
                "unsupported format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let (body_bytes, digest) = bytes[HEADER_LEN..].split_at(bytes.len() - HEADER_LEN - DIGEST_LEN);
        if blake3::hash(body_bytes).as_bytes() != digest {
            return Err(Error::CorruptSnapshot("digest mismatch".to_string()));
        }
        let (body, read): (Body, usize) = bincode::serde::decode_from_slice(body_bytes, bincode::config::standard())
            .map_err(|e| Error::CorruptSnapshot(format!("failed to decode index: {}", e)))?;
        if read != body_bytes.len() {
            return Err(Error::CorruptSnapshot("trailing bytes after index body".to_string()));
        }

        if let Some(actual) = body.dimension {
            if actual != expected_dimension {
                return Err(Error::DimensionMismatch { expected: expected_dimension, actual });
            }
        }

        let mut index = VectorIndex::new();
        for (chunk, vector) in body.entries {
            index
                .insert(chunk, vector)
                .map_err(|e| Error::CorruptSnapshot(format!("invalid entry: {}", e)))?;
        }
        debug!(entries = index.len(), "index snapshot restored");
        Ok(index)
    }
}
