//! HTTP surface for the Lotsearch service.
//!
//! Exposes `GET /search` (the dual-mode retrieval endpoint) and
//! `GET /health`, maps the error taxonomy onto status codes and short
//! machine-readable labels, and applies a permissive CORS layer.

/// CORS middleware.
pub mod middleware;
/// Router construction and request handlers.
pub mod server;

pub use server::SearchGateway;
