//! HTTP route definitions and handlers.
//!
//! The local control API: session state, OAuth provider information,
//! identity-gated document access and health checks.

mod document_routes;
mod health_routes;
mod provider_routes;
mod session_routes;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(session_routes::routes())
        .merge(provider_routes::routes())
        .merge(document_routes::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
