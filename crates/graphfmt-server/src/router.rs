//! Axum router setup for the diagnostics server

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{
    handlers::{get_stats, health_check},
    ServerState,
};

/// Create the axum router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/stats", get(get_stats))
        .with_state(state)
}
