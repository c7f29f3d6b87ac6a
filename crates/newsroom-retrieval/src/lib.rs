#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Chunk, embed and index source documents; answer top-k topic queries.

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info};

use newsroom_core::config::Settings;
use newsroom_core::traits::EmbeddingProvider;
use newsroom_core::{Chunk, Chunker, ChunkingConfig, EmbeddingVector, Error, Result, RetrievalResult, SourceDocument};
use newsroom_vector::VectorIndex;

pub struct Retriever<E> {
    embedder: E,
    chunker: Chunker,
    /// `None` embeds on the calling thread.
    pool: Option<ThreadPool>,
}

impl<E: EmbeddingProvider> Retriever<E> {
    /// `embed_workers` sizes the embedding thread pool; 1 embeds sequentially.
    pub fn new(embedder: E, chunking: ChunkingConfig, embed_workers: usize) -> Result<Self> {
        let chunker = Chunker::new(chunking)?;
        let pool = match embed_workers {
            0 => return Err(Error::InvalidParameter("embed_workers must be greater than 0".to_string())),
            1 => None,
            n => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("newsroom-embed-{}", i))
                    .build()
                    .map_err(|e| Error::InvalidParameter(format!("failed to start embedding pool: {}", e)))?,
            ),
        };
        Ok(Self { embedder, chunker, pool })
    }

    pub fn from_settings(embedder: E, settings: &Settings) -> Result<Self> {
        Self::new(embedder, settings.chunking, settings.retrieval.embed_workers)
    }

    pub fn embedder(&self) -> &E { &self.embedder }
    pub fn chunker(&self) -> &Chunker { &self.chunker }

    /// Chunks and embeds every document into a fresh index.
    ///
    /// Entries are inserted in document order, then chunk order, whatever
    /// order the embeddings complete in. The first embedding failure aborts
    /// the build.
    pub fn build(&self, docs: &[SourceDocument]) -> Result<VectorIndex> {
        let chunks = self.chunker.split_all(docs);
        info!(documents = docs.len(), chunks = chunks.len(), provider = self.embedder.id(), "building index");

        let vectors: Vec<EmbeddingVector> = match &self.pool {
            Some(pool) => pool.install(|| chunks.par_iter().map(|c| self.embed_chunk(c)).collect::<Result<Vec<_>>>())?,
            None => chunks.iter().map(|c| self.embed_chunk(c)).collect::<Result<Vec<_>>>()?,
        };

        let mut index = VectorIndex::new();
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            index.insert(chunk, vector)?;
        }
        info!(entries = index.len(), "index built");
        Ok(index)
    }

    /// Embeds `topic` with the same provider and returns the `k` nearest chunks.
    pub fn query(&self, index: &VectorIndex, topic: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(Error::InvalidParameter("k must be greater than 0".to_string()));
        }
        if let Some(expected) = index.dimension() {
            if expected != self.embedder.dim() {
                return Err(Error::DimensionMismatch { expected, actual: self.embedder.dim() });
            }
        }
        if index.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let vector = self.embed_text("query", topic)?;
        let result = index.query(&vector, k)?;
        debug!(topic, k, hits = result.len(), "retrieved");
        Ok(result)
    }

    fn embed_chunk(&self, chunk: &Chunk) -> Result<EmbeddingVector> {
        self.embed_text(chunk.id(), chunk.text())
    }

    fn embed_text(&self, target: &str, text: &str) -> Result<EmbeddingVector> {
        let vector = self
            .embedder
            .embed(text)
            .map_err(|source| Error::EmbeddingFailure { target: target.to_string(), source })?;
        if vector.len() != self.embedder.dim() {
            return Err(Error::DimensionMismatch { expected: self.embedder.dim(), actual: vector.len() });
        }
        Ok(vector)
    }
}
