use std::hash::Hasher;

use twox_hash::XxHash64;

use newsroom_core::traits::EmbeddingProvider;
use newsroom_core::{EmbeddingVector, ProviderError};

/// Offline embedder: hashes lowercase word tokens into a fixed number of
/// buckets and L2-normalizes the counts.
///
/// Deterministic across runs and platforms, so texts sharing words land close
/// together. Used for tests and for running without network access.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    id: String,
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { id: format!("hashing:xxh64:d{}", dim), dim }
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        let mut v = vec![0f32; self.dim];
        if self.dim == 0 { return Ok(v); }
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            // High bit picks the sign so unrelated tokens tend to cancel.
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        Ok(v)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
