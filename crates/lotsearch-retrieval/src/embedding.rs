use async_trait::async_trait;
use lotsearch_core::{LotsearchError, LotsearchResult};
use std::collections::HashMap;

/// Trait for computing the embedding vector of a piece of query text.
///
/// The dimension of the produced vectors must match the dimension the
/// vector index was built with; that pairing is an external configuration
/// invariant, not something implementations enforce beyond returning a
/// numeric sequence of their own fixed length.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Compute the embedding vector for `text`.
    async fn embed(&self, text: &str) -> LotsearchResult<Vec<f32>>;

    /// Dimension of the vectors this provider produces.
    fn dimension(&self) -> usize;
}

/// Deterministic hashed bag-of-words embedder.
///
/// No remote service involved: terms are hashed into a fixed-size vector
/// weighted by term frequency, then L2-normalized. Used by the test suite
/// and by deployments running without an embedding API key; relevance is
/// crude compared to a learned model but the output is stable across runs,
/// which is what the idempotence guarantees need.
pub struct LocalEmbedding {
    dimension: usize,
}

impl LocalEmbedding {
    /// Create a provider producing vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for LocalEmbedding {
    /// Defaults to 768 dimensions, matching the default vector collection.
    fn default() -> Self {
        Self::new(768)
    }
}

#[async_trait]
impl Embedder for LocalEmbedding {
    async fn embed(&self, text: &str) -> LotsearchResult<Vec<f32>> {
        if text.is_empty() {
            return Err(LotsearchError::Embedding(
                "cannot embed empty text".to_string(),
            ));
        }

        let lowered = text.to_lowercase();
        let terms: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 1)
            .collect();

        // Text with no indexable terms embeds to the zero vector; it will
        // simply match nothing strongly.
        let mut vector = vec![0.0f32; self.dimension];
        if terms.is_empty() {
            return Ok(vector);
        }

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for term in &terms {
            *freq.entry(term).or_insert(0.0) += 1.0;
        }

        // Each term lands in two hashed positions so short queries still
        // spread across the vector.
        let total = terms.len() as f32;
        for (term, count) in &freq {
            let tf = count / total;
            let primary = fnv1a(term.as_bytes()) as usize;
            let secondary = fnv1a(&[term.as_bytes(), b"#"].concat()) as usize;
            vector[primary % self.dimension] += tf;
            vector[secondary % self.dimension] += tf * 0.6;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// FNV-1a hash, used to map terms onto vector positions.
fn fnv1a(data: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16777619);
    }
    hash
}
