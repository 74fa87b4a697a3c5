//! Health check endpoints.

use axum::{routing::get, Router};

use crate::state::AppState;

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Returns 200 OK while the process is serving.
async fn health_check() -> &'static str {
    "OK"
}
