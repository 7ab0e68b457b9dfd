use crate::vector::VectorSearcher;
use async_trait::async_trait;
use lotsearch_core::{LotsearchError, LotsearchResult, VectorMatch};
use serde_json::Value;

/// Default Qdrant REST endpoint.
pub const DEFAULT_URL: &str = "http://localhost:6333";
/// Default collection holding the catalog item vectors.
pub const DEFAULT_COLLECTION: &str = "auction_items";
/// Payload key carrying the document-store id for each point.
pub const DOC_ID_PAYLOAD_KEY: &str = "doc_id";

/// Vector searcher backed by a Qdrant collection over its REST API.
///
/// The collection's native ranking (cosine similarity, descending) is
/// returned as-is — no re-sorting. Each point's payload is expected to
/// carry the document-store id under [`DOC_ID_PAYLOAD_KEY`]; a point
/// without it still comes back as a match with no document reference,
/// which is a data-integrity fault for the hydration policy to handle,
/// not a failure of this adapter.
pub struct QdrantSearcher {
    http: reqwest::Client,
    base_url: String,
    collection: String,
}

impl QdrantSearcher {
    /// Create a searcher for the given endpoint and collection.
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            collection: collection.into(),
        }
    }
}

impl Default for QdrantSearcher {
    fn default() -> Self {
        Self::new(DEFAULT_URL, DEFAULT_COLLECTION)
    }
}

#[async_trait]
impl VectorSearcher for QdrantSearcher {
    async fn search(&self, vector: &[f32], limit: usize) -> LotsearchResult<Vec<VectorMatch>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let body = serde_json::json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true
        });

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LotsearchError::VectorSearch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LotsearchError::VectorSearch(format!(
                "vector index error {status}: {error_body}"
            )));
        }

        let resp_body: Value = resp
            .json()
            .await
            .map_err(|e| LotsearchError::VectorSearch(e.to_string()))?;

        let hits = resp_body["result"].as_array().ok_or_else(|| {
            LotsearchError::VectorSearch(
                "malformed vector search response: missing result array".to_string(),
            )
        })?;

        hits.iter().map(parse_hit).collect()
    }
}

/// Parse one scored point from a Qdrant search response.
fn parse_hit(hit: &Value) -> LotsearchResult<VectorMatch> {
    // Point ids are either UUIDs (strings) or unsigned integers.
    let external_id = match &hit["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let similarity = hit["score"].as_f64().ok_or_else(|| {
        LotsearchError::VectorSearch(format!(
            "malformed vector search response: point {external_id} has no score"
        ))
    })? as f32;

    let doc_id = hit["payload"][DOC_ID_PAYLOAD_KEY]
        .as_str()
        .map(ToString::to_string);

    Ok(VectorMatch {
        external_id,
        similarity,
        doc_id,
    })
}
