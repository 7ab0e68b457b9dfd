use crate::embedding::Embedder;
use async_trait::async_trait;
use lotsearch_core::{LotsearchError, LotsearchResult};

/// Default Gemini API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default embedding model; produces 768-dimension vectors.
pub const DEFAULT_MODEL: &str = "text-embedding-004";
/// Vector dimension of [`DEFAULT_MODEL`].
pub const DEFAULT_DIMENSION: usize = 768;

/// Embedding provider backed by the Gemini `embedContent` endpoint.
///
/// The configured dimension must match the dimension the vector index was
/// created with; that pairing is an external configuration invariant. The
/// adapter itself only verifies that the response carries a numeric
/// vector at `embedding.values` — anything else is a malformed-response
/// failure.
pub struct GeminiEmbedder {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

impl GeminiEmbedder {
    /// Create an embedder for the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Override the API base URL. Chainable builder method.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model id and its vector dimension. Chainable.
    pub fn with_model(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.model = model.into();
        self.dimension = dimension;
        self
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> LotsearchResult<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] }
        });

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LotsearchError::Embedding(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LotsearchError::Embedding(format!(
                "embedding API error {status}: {error_body}"
            )));
        }

        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LotsearchError::Embedding(e.to_string()))?;

        let values = resp_body["embedding"]["values"].as_array().ok_or_else(|| {
            LotsearchError::Embedding(
                "malformed embedding response: missing embedding.values".to_string(),
            )
        })?;

        values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| {
                LotsearchError::Embedding(
                    "malformed embedding response: non-numeric vector entry".to_string(),
                )
            })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
