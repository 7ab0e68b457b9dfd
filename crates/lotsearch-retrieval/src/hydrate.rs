use crate::store::DocumentStore;
use lotsearch_core::{CatalogItem, LotsearchError, LotsearchResult, ScoredItem, VectorMatch};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// What to do with a vector match whose referenced document cannot be
/// found — either because the document was deleted after indexing, or
/// because the index point never carried a document reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingReferencePolicy {
    /// Drop the match from the output. The result count may end up below
    /// the requested limit; staleness between the vector index and the
    /// document store must not fail the request. Default.
    #[default]
    Drop,
    /// Treat the dangling reference as a hydration failure.
    Error,
}

/// Turns ranked vector matches back into full catalog items.
///
/// All referenced ids go into one bulk lookup, then the original ranked
/// order is rebuilt with the full item fields and the similarity score
/// attached — the index's ranking is preserved exactly.
pub struct Hydrator {
    store: Arc<dyn DocumentStore>,
    policy: MissingReferencePolicy,
}

impl Hydrator {
    /// Create a hydrator with the default [`MissingReferencePolicy::Drop`].
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            policy: MissingReferencePolicy::default(),
        }
    }

    /// Set the missing-reference policy. Chainable builder method.
    pub fn with_policy(mut self, policy: MissingReferencePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Hydrate `matches` in order, attaching full item fields and the
    /// similarity score of each match.
    pub async fn hydrate(&self, matches: &[VectorMatch]) -> LotsearchResult<Vec<ScoredItem>> {
        let ids: Vec<String> = matches.iter().filter_map(|m| m.doc_id.clone()).collect();

        let documents = if ids.is_empty() {
            Vec::new()
        } else {
            self.store
                .get_many(&ids)
                .await
                .map_err(|e| LotsearchError::Hydration(format!("document lookup failed: {e}")))?
        };

        let by_id: HashMap<&str, &CatalogItem> =
            documents.iter().map(|d| (d.id.as_str(), d)).collect();

        let mut hydrated = Vec::with_capacity(matches.len());
        for m in matches {
            let document = m.doc_id.as_deref().and_then(|id| by_id.get(id));
            match document {
                Some(item) => hydrated.push(ScoredItem {
                    item: (*item).clone(),
                    score: m.similarity,
                }),
                None => match self.policy {
                    MissingReferencePolicy::Drop => {
                        debug!(
                            external_id = %m.external_id,
                            doc_id = ?m.doc_id,
                            "dropping vector match without a live document"
                        );
                    }
                    MissingReferencePolicy::Error => {
                        return Err(LotsearchError::Hydration(format!(
                            "vector point {} references a missing document",
                            m.external_id
                        )));
                    }
                },
            }
        }

        Ok(hydrated)
    }
}
