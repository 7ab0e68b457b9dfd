use crate::middleware::cors_middleware;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware as axum_mw,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lotsearch_core::LotsearchError;
use lotsearch_retrieval::SearchOrchestrator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Shared application state.
pub struct AppState {
    /// The orchestrator serving every search request.
    pub orchestrator: Arc<SearchOrchestrator>,
}

/// The main HTTP gateway.
pub struct SearchGateway;

impl SearchGateway {
    /// Build the router over an orchestrator.
    pub fn build(orchestrator: Arc<SearchOrchestrator>) -> Router {
        let state = Arc::new(AppState { orchestrator });

        Router::new()
            .route("/search", get(search_handler))
            .route("/health", get(health_handler))
            .layer(axum_mw::from_fn(cors_middleware))
            .with_state(state)
    }
}

/// Raw query parameters for `GET /search`.
///
/// All three arrive as optional raw strings on purpose: a malformed `n`
/// (or `m`) must coerce inside the orchestrator instead of failing
/// extraction with a framework-level 400.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// The search text. Required; its absence is the one validation error.
    pub q: Option<String>,
    /// Requested result count.
    pub n: Option<String>,
    /// Retrieval mode token.
    pub m: Option<String>,
}

/// JSON body for 400/500 responses: a short machine-readable label plus a
/// human-readable message. Never the raw upstream exception detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short machine-readable label.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "lotsearch" }))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let result = state
        .orchestrator
        .search(params.q.as_deref(), params.m.as_deref(), params.n.as_deref())
        .await;

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!(error = %e, "search request failed");
            error_response(&e).into_response()
        }
    }
}

/// Map an error onto its HTTP status, short label, and message.
fn error_response(err: &LotsearchError) -> (StatusCode, Json<ErrorBody>) {
    let (status, label, message) = match err {
        LotsearchError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            "Missing search query",
            "Please provide a search term using the \"q\" query parameter".to_string(),
        ),
        LotsearchError::Embedding(cause) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Embedding generation failed",
            cause.clone(),
        ),
        LotsearchError::VectorSearch(cause) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Vector search failed",
            cause.clone(),
        ),
        LotsearchError::Hydration(cause) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Result hydration failed",
            cause.clone(),
        ),
        LotsearchError::Lexical(cause) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Search failed",
            cause.clone(),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Search failed",
            other.to_string(),
        ),
    };

    (
        status,
        Json(ErrorBody {
            error: label.to_string(),
            message,
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400_with_fixed_label() {
        let err = LotsearchError::Validation("Missing search query".to_string());
        let (status, Json(body)) = error_response(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Missing search query");
        assert!(body.message.contains("\"q\""));
    }

    #[test]
    fn test_upstream_errors_map_to_500_with_stage_label() {
        let cases = [
            (
                LotsearchError::Embedding("timed out".to_string()),
                "Embedding generation failed",
            ),
            (
                LotsearchError::VectorSearch("refused".to_string()),
                "Vector search failed",
            ),
            (
                LotsearchError::Hydration("lookup failed".to_string()),
                "Result hydration failed",
            ),
            (
                LotsearchError::Lexical("disk error".to_string()),
                "Search failed",
            ),
        ];

        for (err, label) in cases {
            let (status, Json(body)) = error_response(&err);
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body.error, label);
            assert!(!body.message.is_empty());
        }
    }

    #[test]
    fn test_message_carries_cause_not_debug_detail() {
        let err = LotsearchError::VectorSearch("connection refused".to_string());
        let (_, Json(body)) = error_response(&err);
        assert_eq!(body.message, "connection refused");
    }
}
