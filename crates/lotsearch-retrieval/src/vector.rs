use async_trait::async_trait;
use lotsearch_core::{LotsearchError, LotsearchResult, VectorMatch};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Trait for nearest-neighbor queries against a vector index.
///
/// Implementations return matches ordered by descending similarity — the
/// backend's native ranking is trusted as-is, callers never re-sort.
#[async_trait]
pub trait VectorSearcher: Send + Sync {
    /// The top-`limit` points nearest to `vector`, best first.
    async fn search(&self, vector: &[f32], limit: usize) -> LotsearchResult<Vec<VectorMatch>>;
}

/// One indexed point: an id, its embedding, and the document it references.
struct IndexPoint {
    id: Uuid,
    vector: Vec<f32>,
    doc_id: Option<String>,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Suitable for tests and single-process deployments with small catalogs;
/// larger deployments point the service at a remote index instead.
pub struct InMemoryVectorIndex {
    points: RwLock<Vec<IndexPoint>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            points: RwLock::new(Vec::new()),
        }
    }

    /// Index a vector referencing the given document id, returning the
    /// assigned point id. A `None` document reference is accepted — the
    /// hydration policy decides what to do with such points at query time.
    pub async fn insert(&self, vector: Vec<f32>, doc_id: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        let mut points = self.points.write().await;
        points.push(IndexPoint {
            id,
            vector,
            doc_id,
        });
        id
    }

    /// Number of indexed points.
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    /// Whether the index holds no points.
    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorSearcher for InMemoryVectorIndex {
    async fn search(&self, vector: &[f32], limit: usize) -> LotsearchResult<Vec<VectorMatch>> {
        if vector.is_empty() {
            return Err(LotsearchError::VectorSearch(
                "empty query vector".to_string(),
            ));
        }

        let points = self.points.read().await;
        let mut matches: Vec<VectorMatch> = points
            .iter()
            .map(|p| VectorMatch {
                external_id: p.id.to_string(),
                similarity: cosine_similarity(vector, &p.vector),
                doc_id: p.doc_id.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }
}

/// Cosine similarity between two vectors; 0.0 on dimension mismatch.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
