#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod article;
pub mod chunker;
pub mod config;
pub mod error;
pub mod sources;
pub mod traits;
pub mod types;

pub use article::{Article, StructureDefect};
pub use chunker::{split, Chunker, ChunkingConfig};
pub use error::{Error, ProviderError, ProviderErrorCode, Result};
pub use types::{Chunk, ChunkId, ContextBundle, EmbeddingVector, RetrievalResult, ScoredChunk, SourceDocument};
