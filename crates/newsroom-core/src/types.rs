//! Domain types shared by the retrieval and agent crates.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;
pub type EmbeddingVector = Vec<f32>;

/// Raw text handed to the pipeline by a document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub source_id: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), text: text.into() }
    }
}

/// A contiguous slice of a source document, retrieved as one unit.
///
/// - `id`: `"<source_ref>:<sequence_index>"`, unique within one build
/// - `text`: the chunk payload
/// - `source_ref`: identifier of the document the chunk was cut from
/// - `sequence_index`: emission order within that document
///
/// Chunks are never mutated after the chunker emits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    id: ChunkId,
    text: String,
    source_ref: String,
    sequence_index: usize,
}

impl Chunk {
    pub fn new(source_ref: impl Into<String>, sequence_index: usize, text: impl Into<String>) -> Self {
        let source_ref = source_ref.into();
        Self {
            id: format!("{}:{}", source_ref, sequence_index),
            text: text.into(),
            source_ref,
            sequence_index,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn text(&self) -> &str { &self.text }
    pub fn source_ref(&self) -> &str { &self.source_ref }
    pub fn sequence_index(&self) -> usize { self.sequence_index }
}

/// One retrieval hit. `distance` is cosine distance, lower is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

impl ScoredChunk {
    pub fn similarity(&self) -> f32 { 1.0 - self.distance }
}

/// Hits ordered by ascending distance; never longer than the requested k.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Callers are expected to pass hits already sorted by distance.
    pub fn new(hits: Vec<ScoredChunk>) -> Self { Self { hits } }

    pub fn len(&self) -> usize { self.hits.len() }
    pub fn is_empty(&self) -> bool { self.hits.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk> { self.hits.iter() }
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> { self.hits.iter().map(|h| &h.chunk) }
    pub fn into_hits(self) -> Vec<ScoredChunk> { self.hits }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a ScoredChunk;
    type IntoIter = std::slice::Iter<'a, ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter { self.hits.iter() }
}

/// Grounding material handed from retrieval to the writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub topic: String,
    pub text: String,
    pub chunk_ids: Vec<ChunkId>,
}

impl ContextBundle {
    pub const SEPARATOR: &'static str = "\n\n";

    /// Concatenates the hit texts in rank order.
    pub fn from_retrieval(topic: impl Into<String>, result: &RetrievalResult) -> Self {
        let text = result.chunks().map(Chunk::text).collect::<Vec<_>>().join(Self::SEPARATOR);
        let chunk_ids = result.chunks().map(|c| c.id().to_string()).collect();
        Self { topic: topic.into(), text, chunk_ids }
    }

    /// Bundle built from caller-supplied context rather than a retrieval run.
    pub fn from_text(topic: impl Into<String>, text: impl Into<String>) -> Self {
        Self { topic: topic.into(), text: text.into(), chunk_ids: Vec::new() }
    }

    pub fn is_empty(&self) -> bool { self.text.trim().is_empty() }
}
