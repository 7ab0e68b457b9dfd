//! Retrieval adapters and the search orchestrator for Lotsearch.
//!
//! The three external collaborators — embedding provider, vector index,
//! and document store — sit behind small capability traits so the
//! orchestrator can be exercised with deterministic in-process
//! implementations and wired to remote services in production.
//!
//! # Main types
//!
//! - [`Embedder`] — Trait for turning query text into an embedding vector.
//! - [`VectorSearcher`] — Trait for nearest-neighbor queries.
//! - [`DocumentStore`] — Trait for text search and bulk id lookup.
//! - [`Hydrator`] — Re-attaches full item fields to vector matches.
//! - [`SearchOrchestrator`] — Validates, branches on mode, assembles the
//!   response envelope.

/// Remote adapters for the embedding provider and the vector index.
pub mod backends;
/// Embedding provider trait and local implementation.
pub mod embedding;
/// Hydration of vector matches into full catalog items.
pub mod hydrate;
/// Request validation, mode branching, and response assembly.
pub mod orchestrator;
/// Document store trait and SQLite implementation.
pub mod store;
/// Vector searcher trait and in-memory implementation.
pub mod vector;

pub use backends::gemini::GeminiEmbedder;
pub use backends::qdrant::QdrantSearcher;
pub use embedding::{Embedder, LocalEmbedding};
pub use hydrate::{Hydrator, MissingReferencePolicy};
pub use orchestrator::{SearchOrchestrator, DEFAULT_LIMIT};
pub use store::{DocumentStore, SqliteDocumentStore};
pub use vector::{InMemoryVectorIndex, VectorSearcher};
