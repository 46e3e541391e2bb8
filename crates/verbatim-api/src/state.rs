//! Shared state for the lookup handlers.

use std::sync::Arc;

use verbatim_core::providers::SearchIndex;

/// State passed to handlers via axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// The same index the assistant queries.
    pub index: Arc<dyn SearchIndex>,
    /// Full-text index name to query.
    pub index_name: String,
}

impl AppState {
    pub fn new(index: Arc<dyn SearchIndex>, index_name: impl Into<String>) -> Self {
        Self {
            index,
            index_name: index_name.into(),
        }
    }
}
