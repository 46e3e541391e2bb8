//! Read-only HTTP lookup over the quote index.
//!
//! One endpoint, `GET /lookup`, doing prefix autocomplete against the
//! same full-text index the assistant uses, plus a health probe. The
//! assistant itself never goes through HTTP; this surface exists for
//! external tooling.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, serve};
pub use state::AppState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use verbatim_core::types::{PersonRef, Relation};
    use verbatim_retrieval::{MemoryIndex, QuoteDoc};

    use crate::handlers::LookupResponse;
    use crate::{create_router, AppState};

    fn state() -> AppState {
        let index = MemoryIndex::new();
        index.add(QuoteDoc {
            id: "q1".to_string(),
            quote: "Imagination is more important than knowledge.".to_string(),
            source: "Interview (1929)".to_string(),
            heading_context: String::new(),
            status: "verified".to_string(),
            people: vec![PersonRef::new(Relation::SaidBy, "Albert Einstein")],
        });
        index.add(QuoteDoc {
            id: "q2".to_string(),
            quote: "Knowledge speaks, but wisdom listens.".to_string(),
            source: String::new(),
            heading_context: String::new(),
            status: String::new(),
            people: Vec::new(),
        });
        AppState::new(Arc::new(index), "quoteTextFT")
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let router = create_router(state());
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_lookup_prefix_matches() {
        let (status, body) = get_json("/lookup?q=imagina").await;
        assert_eq!(status, StatusCode::OK);
        let parsed: LookupResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.count, 1);
        assert_eq!(parsed.results[0].id, "q1");
        assert_eq!(parsed.results[0].people[0].name, "Albert Einstein");
    }

    #[tokio::test]
    async fn test_lookup_limit() {
        let (_, body) = get_json("/lookup?q=knowledge&limit=1").await;
        let parsed: LookupResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.count, 1);
    }

    #[tokio::test]
    async fn test_lookup_requires_query() {
        let (status, body) = get_json("/lookup").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_lookup_no_hits() {
        let (status, body) = get_json("/lookup?q=zebra").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }
}
