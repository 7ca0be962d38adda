use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Sessions
        .route("/api/v1/sessions", post(handlers::prepare_session))
        .route("/api/v1/sessions/{session_id}/status", get(handlers::session_status))
        .route("/api/v1/sessions/{session_id}/design", get(handlers::session_design))

        // Background jobs
        .route("/api/v1/exports", post(handlers::enqueue_export))
        .route("/api/v1/imports", post(handlers::enqueue_import))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
