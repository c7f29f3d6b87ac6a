use tracing::info;

use newsroom_core::traits::EmbeddingProvider;
use newsroom_core::{ContextBundle, Error, Result, SourceDocument};
use newsroom_retrieval::Retriever;
use newsroom_vector::VectorIndex;

/// Gathers grounding context for a topic: index the sources, take the top-k
/// passages, concatenate them.
pub struct ResearchAgent<E> {
    retriever: Retriever<E>,
    k: usize,
}

impl<E: EmbeddingProvider> ResearchAgent<E> {
    pub fn new(retriever: Retriever<E>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidParameter("k must be greater than 0".to_string()));
        }
        Ok(Self { retriever, k })
    }

    pub fn retriever(&self) -> &Retriever<E> { &self.retriever }
    pub fn k(&self) -> usize { self.k }

    pub fn gather(&self, topic: &str, sources: &[SourceDocument]) -> Result<ContextBundle> {
        let index = self.build(sources)?;
        self.retrieve(&index, topic, self.k)
    }

    /// Same as [`ResearchAgent::gather`] over an index built or restored elsewhere.
    pub fn gather_from_index(&self, topic: &str, index: &VectorIndex) -> Result<ContextBundle> {
        self.retrieve(index, topic, self.k)
    }

    pub fn build(&self, sources: &[SourceDocument]) -> Result<VectorIndex> {
        self.retriever.build(sources)
    }

    /// Fails with `NoRelevantContext` when there is nothing to retrieve from.
    pub fn retrieve(&self, index: &VectorIndex, topic: &str, k: usize) -> Result<ContextBundle> {
        if index.is_empty() {
            return Err(Error::NoRelevantContext(topic.to_string()));
        }
        let result = self.retriever.query(index, topic, k)?;
        let bundle = ContextBundle::from_retrieval(topic, &result);
        info!(topic, passages = bundle.chunk_ids.len(), chars = bundle.text.len(), "research gathered");
        Ok(bundle)
    }
}
