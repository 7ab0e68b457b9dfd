//! Core types and error definitions for the Lotsearch service.
//!
//! This crate provides the foundational types shared across all Lotsearch
//! crates: the error taxonomy, the catalog item wire shapes, and the
//! search mode/response envelope.
//!
//! # Main types
//!
//! - [`LotsearchError`] — Unified error enum for all Lotsearch subsystems.
//! - [`LotsearchResult`] — Convenience alias for `Result<T, LotsearchError>`.
//! - [`CatalogItem`] — A catalog item as stored in the document store.
//! - [`ScoredItem`] — A catalog item paired with a retrieval score.
//! - [`SearchMode`] — The closed lexical/semantic retrieval mode enum.
//! - [`SearchResponse`] — The per-request response envelope.

use serde::{Deserialize, Serialize};

// --- Error types ---

/// Top-level error type for the Lotsearch service.
///
/// The upstream variants ([`Embedding`](Self::Embedding),
/// [`VectorSearch`](Self::VectorSearch), [`Hydration`](Self::Hydration),
/// [`Lexical`](Self::Lexical)) identify which retrieval stage failed and
/// carry the original cause message. None of them is retried, and a failure
/// in one mode never falls back to the other.
#[derive(Debug, thiserror::Error)]
pub enum LotsearchError {
    /// Caller input failed validation before any outbound call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The embedding provider failed or returned a malformed vector.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The vector index query failed.
    #[error("Vector search error: {0}")]
    VectorSearch(String),

    /// The document lookup while hydrating vector matches failed.
    #[error("Hydration error: {0}")]
    Hydration(String),

    /// The document store's full-text search failed.
    #[error("Lexical search error: {0}")]
    Lexical(String),

    /// A storage-layer fault from the document store, below the stage
    /// mapping applied by the orchestrator and hydrator.
    #[error("Store error: {0}")]
    Store(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`LotsearchError`].
pub type LotsearchResult<T> = Result<T, LotsearchError>;

// --- Catalog item types ---

/// A catalog item as read from the document store.
///
/// The search core only ever reads items; nothing here mutates the catalog.
/// Field names on the wire match the stored projection: `_id`, `title`,
/// `description`, `start_price`, `reserve_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Opaque document-store identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Item title.
    pub title: String,
    /// Free-text item description.
    pub description: String,
    /// Opening price for the item.
    pub start_price: f64,
    /// Reserve price for the item.
    pub reserve_price: f64,
}

/// A catalog item paired with a retrieval score.
///
/// `score` is text relevance on the lexical path and cosine similarity on
/// the semantic path. Within one response the score sequence is
/// non-increasing. The item fields are flattened so every element of
/// `items` carries all five catalog fields plus `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// The hydrated catalog item.
    #[serde(flatten)]
    pub item: CatalogItem,
    /// Retrieval score, larger is more relevant.
    pub score: f32,
}

// --- Search mode ---

/// The retrieval mode for a search request.
///
/// This is a closed two-way branch with [`Semantic`](Self::Semantic) as the
/// default: the legacy `mongo` token existing clients send selects the
/// full-text path, and every other value — absent, unrecognized, or
/// malformed — falls back to semantic retrieval. Rejecting unknown tokens
/// instead would be the stricter alternative; the permissive fallback is
/// kept deliberately and covered by tests. Note that semantic is the more
/// failure-prone path: it depends on two remote services (embedding
/// provider and vector index) instead of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// Full-text relevance ranking against the document store.
    #[serde(rename = "mongo")]
    Lexical,
    /// Embedding-vector similarity against the vector index.
    #[default]
    #[serde(rename = "semantic")]
    Semantic,
}

impl SearchMode {
    /// The reserved wire token that selects the lexical path.
    pub const LEXICAL_TOKEN: &'static str = "mongo";

    /// Select the mode from a raw `m` query parameter.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some(token) if token == Self::LEXICAL_TOKEN => Self::Lexical,
            _ => Self::Semantic,
        }
    }

    /// The wire token echoed in responses for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lexical => Self::LEXICAL_TOKEN,
            Self::Semantic => "semantic",
        }
    }
}

// --- Response envelope ---

/// The response envelope for one search request.
///
/// Constructed once per request and returned immediately; never cached or
/// persisted. `count` always equals `items.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ranked results, scores non-increasing.
    pub items: Vec<ScoredItem>,
    /// Number of items returned.
    pub count: usize,
    /// The caller's query text, echoed verbatim.
    pub query: String,
    /// The mode the request was served with.
    pub mode: SearchMode,
}

impl SearchResponse {
    /// Build a response envelope, deriving `count` from `items`.
    pub fn new(items: Vec<ScoredItem>, query: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            count: items.len(),
            items,
            query: query.into(),
            mode,
        }
    }
}

// --- Vector match ---

/// One ranked hit from the vector index, before hydration.
///
/// Bridges the index's own identifier space to the document store's:
/// `doc_id` is read from the point payload and may be absent when the
/// index holds a malformed point — the hydrator's missing-reference policy
/// decides what happens then.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    /// The vector index's own point identifier.
    pub external_id: String,
    /// Cosine similarity reported by the index.
    pub similarity: f32,
    /// The referenced document-store identifier, if the payload carried one.
    pub doc_id: Option<String>,
}
