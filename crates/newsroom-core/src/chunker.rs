use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Chunk, SourceDocument};

/// Window size and overlap, both counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidParameter("chunk_size must be greater than 0".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidParameter(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    fn stride(&self) -> usize { self.chunk_size - self.overlap }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig { self.config }

    pub fn split(&self, text: &str, source_ref: &str) -> Vec<Chunk> {
        // Byte offsets of every char start, plus the end of the text.
        let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let n_chars = bounds.len() - 1;
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < n_chars {
            let end = (start + self.config.chunk_size).min(n_chars);
            chunks.push(Chunk::new(source_ref, chunks.len(), &text[bounds[start]..bounds[end]]));
            if end == n_chars { break; }
            start += self.config.stride();
        }
        debug!(source = source_ref, chars = n_chars, chunks = chunks.len(), "split document");
        chunks
    }

    /// Chunks every document, keeping document order then sequence order.
    pub fn split_all(&self, docs: &[SourceDocument]) -> Vec<Chunk> {
        docs.iter().flat_map(|d| self.split(&d.text, &d.source_id)).collect()
    }
}

/// Splits `text` into overlapping character windows.
///
/// Fails with `InvalidParameter` unless `chunk_size > 0` and `overlap < chunk_size`.
/// Empty input gives no chunks; input shorter than `chunk_size` gives one.
pub fn split(text: &str, source_ref: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let chunker = Chunker::new(ChunkingConfig { chunk_size, overlap })?;
    Ok(chunker.split(text, source_ref))
}
