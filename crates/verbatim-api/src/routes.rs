//! Router setup for the read-only lookup service.

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with the lookup routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/lookup", get(handlers::lookup))
        .with_state(state)
}

/// Bind and serve the lookup API until the process exits.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr, "Lookup API listening");
    axum::serve(listener, create_router(state)).await
}
