use std::collections::HashSet;

use tracing::debug;

use newsroom_core::{Chunk, Error, Result, RetrievalResult, ScoredChunk};

/// Exact nearest-neighbour index over (chunk, vector) pairs.
///
/// Append-only and keyed by chunk id: each id holds exactly one vector. The
/// first insert fixes the dimension; every later vector and every query must
/// match it. Queries are a brute-force linear scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dimension: Option<usize>,
    pub(crate) entries: Vec<Entry>,
    ids: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub(crate) chunk: Chunk,
    pub(crate) vector: Vec<f32>,
    norm: f32,
}

impl VectorIndex {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// `None` until the first insert.
    pub fn dimension(&self) -> Option<usize> { self.dimension }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> { self.entries.iter().map(|e| &e.chunk) }

    pub fn contains(&self, id: &str) -> bool { self.ids.contains(id) }

    pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::InvalidParameter(format!("empty vector for chunk {}", chunk.id())));
        }
        if self.ids.contains(chunk.id()) {
            return Err(Error::InvalidParameter(format!("duplicate chunk id {}", chunk.id())));
        }
        match self.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(Error::DimensionMismatch { expected, actual: vector.len() });
            }
            Some(_) => {}
            None => self.dimension = Some(vector.len()),
        }
        let norm = l2_norm(&vector);
        self.ids.insert(chunk.id().to_string());
        self.entries.push(Entry { chunk, vector, norm });
        Ok(())
    }

    /// The `k` entries closest to `vector` by cosine distance, nearest first.
    ///
    /// Returns every entry when the index holds fewer than `k`; equal
    /// distances keep insertion order. `k == 0` yields an empty result.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<RetrievalResult> {
        let expected = match self.dimension {
            Some(d) if !self.entries.is_empty() => d,
            _ => return Err(Error::EmptyIndex),
        };
        if vector.len() != expected {
            return Err(Error::DimensionMismatch { expected, actual: vector.len() });
        }
        if k == 0 {
            return Ok(RetrievalResult::default());
        }

        let q_norm = l2_norm(vector);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, distance_with_norms(vector, q_norm, &e.vector, e.norm)))
            .collect();
        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        debug!(entries = self.entries.len(), k, returned = scored.len(), "vector query");
        let hits = scored
            .into_iter()
            .map(|(i, distance)| ScoredChunk { chunk: self.entries[i].chunk.clone(), distance })
            .collect();
        Ok(RetrievalResult::new(hits))
    }
}

/// `1 - cos(a, b)`; 1.0 when either vector has zero magnitude.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    distance_with_norms(a, l2_norm(a), b, l2_norm(b))
}

fn distance_with_norms(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 1.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    1.0 - dot / (a_norm * b_norm)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
