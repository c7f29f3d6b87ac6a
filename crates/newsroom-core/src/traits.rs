use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::types::{EmbeddingVector, SourceDocument};

/// Maps text to fixed-dimension vectors.
///
/// Implementations own their transport policy (timeouts, retries); callers
/// treat `embed` as a pure function of the input for a given `id`.
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model, e.g. `openai:text-embedding-3-small:d1536`.
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> std::result::Result<EmbeddingVector, ProviderError>;
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    fn id(&self) -> &str { (**self).id() }
    fn dim(&self) -> usize { (**self).dim() }
    fn embed(&self, text: &str) -> std::result::Result<EmbeddingVector, ProviderError> { (**self).embed(text) }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<T> {
    fn id(&self) -> &str { (**self).id() }
    fn dim(&self) -> usize { (**self).dim() }
    fn embed(&self, text: &str) -> std::result::Result<EmbeddingVector, ProviderError> { (**self).embed(text) }
}

/// Free-form text generation from a single prompt.
pub trait GenerativeProvider: Send + Sync {
    fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

impl<T: GenerativeProvider + ?Sized> GenerativeProvider for Box<T> {
    fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError> { (**self).generate(prompt) }
}

impl<T: GenerativeProvider + ?Sized> GenerativeProvider for Arc<T> {
    fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError> { (**self).generate(prompt) }
}

/// Supplies `(source_id, raw_text)` documents for a topic.
pub trait DocumentSource {
    fn documents(&self, topic: &str) -> Result<Vec<SourceDocument>>;
}

/// Opaque byte storage for index snapshots, keyed by name.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>>;
    fn save(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>> { (**self).load(name) }
    fn save(&self, name: &str, bytes: &[u8]) -> Result<()> { (**self).save(name, bytes) }
}
