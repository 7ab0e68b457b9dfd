use crate::embedding::Embedder;
use crate::hydrate::{Hydrator, MissingReferencePolicy};
use crate::store::DocumentStore;
use crate::vector::VectorSearcher;
use lotsearch_core::{LotsearchError, LotsearchResult, SearchMode, SearchResponse};
use std::sync::Arc;
use tracing::{debug, info};

/// Effective result limit when the caller sends none, or sends something
/// that does not parse as a positive integer.
pub const DEFAULT_LIMIT: usize = 10;

/// Validates raw request input, picks the retrieval mode, runs the
/// matching adapter chain, and assembles the response envelope.
///
/// The lexical path makes one call (document store text search). The
/// semantic path is strictly sequential across two remote dependencies
/// plus the store: embed, then vector search, then hydration — which
/// makes it the more failure-prone of the two. A failure at any stage
/// aborts the request with that stage's upstream error; there are no
/// retries and no fallback to the other mode.
pub struct SearchOrchestrator {
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorSearcher>,
    store: Arc<dyn DocumentStore>,
    hydrator: Hydrator,
    default_limit: usize,
}

impl SearchOrchestrator {
    /// Create an orchestrator over the three retrieval capabilities.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorSearcher>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let hydrator = Hydrator::new(store.clone());
        Self {
            embedder,
            vectors,
            store,
            hydrator,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Override the default result limit. Chainable builder method.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Override the hydration missing-reference policy. Chainable.
    pub fn with_missing_reference_policy(mut self, policy: MissingReferencePolicy) -> Self {
        self.hydrator = Hydrator::new(self.store.clone()).with_policy(policy);
        self
    }

    /// Run one search request from raw query-string inputs.
    ///
    /// Fails with a validation error when `raw_query` is absent or trims
    /// to empty — before any outbound call. `raw_limit` coerces to
    /// [`DEFAULT_LIMIT`] unless it parses as a positive integer; there is
    /// no upper bound beyond what the backends return. `raw_mode` selects
    /// the path via [`SearchMode::from_param`].
    pub async fn search(
        &self,
        raw_query: Option<&str>,
        raw_mode: Option<&str>,
        raw_limit: Option<&str>,
    ) -> LotsearchResult<SearchResponse> {
        let raw_query = raw_query
            .ok_or_else(|| LotsearchError::Validation("Missing search query".to_string()))?;
        let text = raw_query.trim();
        if text.is_empty() {
            return Err(LotsearchError::Validation(
                "Missing search query".to_string(),
            ));
        }

        let limit = coerce_limit(raw_limit, self.default_limit);
        let mode = SearchMode::from_param(raw_mode);
        info!(
            query_len = text.len(),
            mode = mode.as_str(),
            limit,
            "search request"
        );

        let mut items = match mode {
            SearchMode::Lexical => self
                .store
                .text_search(text, limit)
                .await
                .map_err(|e| LotsearchError::Lexical(e.to_string()))?,
            SearchMode::Semantic => {
                let vector = self.embedder.embed(text).await?;
                let matches = self.vectors.search(&vector, limit).await?;
                self.hydrator.hydrate(&matches).await?
            }
        };

        // Backends already honor the limit; this only guards against an
        // implementation returning more than asked.
        items.truncate(limit);

        debug!(count = items.len(), "search complete");
        Ok(SearchResponse::new(items, raw_query, mode))
    }
}

/// Parse a raw limit parameter, falling back to `default` when it is
/// absent, non-numeric, zero, or negative.
fn coerce_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::embedding::LocalEmbedding;
    use crate::store::SqliteDocumentStore;
    use crate::vector::InMemoryVectorIndex;
    use async_trait::async_trait;
    use lotsearch_core::CatalogItem;

    const CATALOG: &[(&str, &str, &str)] = &[
        ("1", "Wooden chest", "Antique oak chest with brass fittings"),
        ("2", "Vintage wooden clock", "Wooden mantel clock, mid-century"),
        ("3", "Porcelain vase", "Hand-painted porcelain, no chips"),
        ("4", "Oil painting", "Landscape oil painting in wooden frame"),
    ];

    struct Fixture {
        orchestrator: SearchOrchestrator,
        index: Arc<InMemoryVectorIndex>,
        embedder: Arc<LocalEmbedding>,
    }

    /// Seed the store and index the catalog with embeddings of
    /// title + description, the same text shape loaders index.
    async fn fixture() -> Fixture {
        let embedder = Arc::new(LocalEmbedding::new(64));
        let store = Arc::new(SqliteDocumentStore::open_in_memory().unwrap());
        let index = Arc::new(InMemoryVectorIndex::new());

        for (id, title, description) in CATALOG {
            let item = CatalogItem {
                id: (*id).to_string(),
                title: (*title).to_string(),
                description: (*description).to_string(),
                start_price: 25.0,
                reserve_price: 75.0,
            };
            store.insert_item(&item).await.unwrap();

            let embedding = embedder.embed(&format!("{title} {description}")).await.unwrap();
            index.insert(embedding, Some((*id).to_string())).await;
        }

        let orchestrator = SearchOrchestrator::new(
            embedder.clone(),
            index.clone(),
            store,
        );
        Fixture {
            orchestrator,
            index,
            embedder,
        }
    }

    #[tokio::test]
    async fn test_missing_query_is_validation_error() {
        let f = fixture().await;
        let err = f.orchestrator.search(None, None, None).await.unwrap_err();
        assert!(matches!(err, LotsearchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_query_is_validation_error() {
        let f = fixture().await;
        let err = f
            .orchestrator
            .search(Some("   \t"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LotsearchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_semantic_is_the_default_mode() {
        let f = fixture().await;
        let resp = f.orchestrator.search(Some("wooden"), None, None).await.unwrap();
        assert_eq!(resp.mode, SearchMode::Semantic);
        assert_eq!(resp.query, "wooden");
        assert_eq!(resp.count, resp.items.len());
    }

    #[tokio::test]
    async fn test_unrecognized_mode_falls_back_to_semantic() {
        let f = fixture().await;
        for token in ["qdrant", "MONGO", "lexical", ""] {
            let resp = f
                .orchestrator
                .search(Some("wooden"), Some(token), None)
                .await
                .unwrap();
            assert_eq!(resp.mode, SearchMode::Semantic, "token {token:?}");
        }
    }

    #[tokio::test]
    async fn test_lexical_mode_via_reserved_token() {
        let f = fixture().await;
        let resp = f
            .orchestrator
            .search(Some("wooden"), Some("mongo"), Some("5"))
            .await
            .unwrap();

        assert_eq!(resp.mode, SearchMode::Lexical);
        assert!(resp.items.len() <= 5);
        assert!(!resp.items.is_empty());
        for pair in resp.items.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_semantic_results_are_hydrated_and_ordered() {
        let f = fixture().await;
        let resp = f
            .orchestrator
            .search(Some("wooden chest"), None, None)
            .await
            .unwrap();

        assert!(!resp.items.is_empty());
        for item in &resp.items {
            assert!(!item.item.title.is_empty());
            assert!(!item.item.id.is_empty());
        }
        for pair in resp.items.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_limit_coercion_to_default() {
        let f = fixture().await;
        for bad in [None, Some("abc"), Some("0"), Some("-3"), Some("2.5")] {
            let resp = f
                .orchestrator
                .search(Some("wooden"), Some("mongo"), bad)
                .await
                .unwrap();
            assert!(resp.items.len() <= DEFAULT_LIMIT, "limit {bad:?}");
        }
    }

    #[tokio::test]
    async fn test_limit_truncates_results() {
        let f = fixture().await;
        let resp = f
            .orchestrator
            .search(Some("wooden"), None, Some("2"))
            .await
            .unwrap();
        assert!(resp.items.len() <= 2);
        assert_eq!(resp.count, resp.items.len());
    }

    #[tokio::test]
    async fn test_dangling_index_reference_is_dropped() {
        let f = fixture().await;
        // Index a point whose document does not exist.
        let embedding = f.embedder.embed("wooden chest").await.unwrap();
        f.index.insert(embedding, Some("deleted".to_string())).await;

        let resp = f
            .orchestrator
            .search(Some("wooden chest"), None, Some("10"))
            .await
            .unwrap();

        // Dropped silently: fewer items than index matches, never an error.
        assert_eq!(resp.items.len(), CATALOG.len());
        assert!(resp.items.iter().all(|i| i.item.id != "deleted"));
    }

    #[tokio::test]
    async fn test_strict_policy_surfaces_dangling_reference() {
        let f = fixture().await;
        let embedding = f.embedder.embed("wooden chest").await.unwrap();
        f.index.insert(embedding, Some("deleted".to_string())).await;

        let empty_store = Arc::new(SqliteDocumentStore::open_in_memory().unwrap());
        let strict = SearchOrchestrator::new(f.embedder.clone(), f.index.clone(), empty_store)
            .with_missing_reference_policy(MissingReferencePolicy::Error);

        let err = strict
            .search(Some("wooden chest"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LotsearchError::Hydration(_)));
    }

    #[tokio::test]
    async fn test_same_request_is_idempotent() {
        let f = fixture().await;
        let first = f
            .orchestrator
            .search(Some("wooden"), None, Some("3"))
            .await
            .unwrap();
        let second = f
            .orchestrator
            .search(Some("wooden"), None, Some("3"))
            .await
            .unwrap();

        assert_eq!(first.items, second.items);
        assert_eq!(first.count, second.count);
    }

    #[tokio::test]
    async fn test_query_echoed_verbatim() {
        let f = fixture().await;
        let resp = f
            .orchestrator
            .search(Some("  wooden  "), None, None)
            .await
            .unwrap();
        assert_eq!(resp.query, "  wooden  ");
    }

    // --- Stage identity of upstream failures ---

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> LotsearchResult<Vec<f32>> {
            Err(LotsearchError::Embedding("connection refused".to_string()))
        }

        fn dimension(&self) -> usize {
            64
        }
    }

    struct FailingVectorSearcher;

    #[async_trait]
    impl VectorSearcher for FailingVectorSearcher {
        async fn search(
            &self,
            _vector: &[f32],
            _limit: usize,
        ) -> LotsearchResult<Vec<lotsearch_core::VectorMatch>> {
            Err(LotsearchError::VectorSearch("index unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_semantic_search() {
        let f = fixture().await;
        let store = Arc::new(SqliteDocumentStore::open_in_memory().unwrap());
        let orchestrator =
            SearchOrchestrator::new(Arc::new(FailingEmbedder), f.index.clone(), store);

        let err = orchestrator
            .search(Some("wooden"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LotsearchError::Embedding(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_vector_failure_aborts_without_lexical_fallback() {
        let f = fixture().await;
        let store = Arc::new(SqliteDocumentStore::open_in_memory().unwrap());
        let orchestrator = SearchOrchestrator::new(
            f.embedder.clone(),
            Arc::new(FailingVectorSearcher),
            store,
        );

        // The lexical path would succeed here; it must not be used.
        let err = orchestrator
            .search(Some("wooden"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LotsearchError::VectorSearch(_)));
    }

    #[tokio::test]
    async fn test_lexical_failure_carries_stage_identity() {
        let f = fixture().await;
        struct BrokenStore;

        #[async_trait]
        impl DocumentStore for BrokenStore {
            async fn text_search(
                &self,
                _query: &str,
                _limit: usize,
            ) -> LotsearchResult<Vec<lotsearch_core::ScoredItem>> {
                Err(LotsearchError::Store("disk I/O error".to_string()))
            }

            async fn get_many(
                &self,
                _ids: &[String],
            ) -> LotsearchResult<Vec<CatalogItem>> {
                Ok(Vec::new())
            }
        }

        let orchestrator = SearchOrchestrator::new(
            f.embedder.clone(),
            f.index.clone(),
            Arc::new(BrokenStore),
        );
        let err = orchestrator
            .search(Some("wooden"), Some("mongo"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LotsearchError::Lexical(_)));
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn test_coerce_limit() {
        assert_eq!(coerce_limit(Some("5"), 10), 5);
        assert_eq!(coerce_limit(Some(" 7 "), 10), 7);
        assert_eq!(coerce_limit(None, 10), 10);
        assert_eq!(coerce_limit(Some("0"), 10), 10);
        assert_eq!(coerce_limit(Some("-1"), 10), 10);
        assert_eq!(coerce_limit(Some("abc"), 10), 10);
        assert_eq!(coerce_limit(Some("3.5"), 10), 10);
        assert_eq!(coerce_limit(Some(""), 10), 10);
        assert_eq!(coerce_limit(Some("100"), 10), 100);
    }
}
