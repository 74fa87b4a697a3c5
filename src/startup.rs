//! Application startup and server initialization.
//!
//! This module initialises the backend handles, binds the client session to
//! the authenticator and serves the local control API.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::backend::Backend;
use crate::config::ConfigV1;
use crate::error::BackendError;
use crate::routes;
use crate::session::{bind_session, SessionStore};
use crate::state::AppState;

/// Builds the shared state: backend handles plus a session store bound to
/// the authenticator.
pub async fn build_state(config: Arc<ConfigV1>) -> Result<AppState, BackendError> {
    let backend = Arc::new(Backend::initialize(&config).await?);
    let session = SessionStore::new();
    bind_session(backend.auth.as_ref(), &session);

    Ok(AppState {
        config,
        backend,
        session,
    })
}

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the backend cannot be initialised, the server fails
/// to bind to the configured address, or it fails while serving.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone()).await?;
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Serving session API on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
