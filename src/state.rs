//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! configuration, the backend handles and the client session.

use crate::backend::Backend;
use crate::config::ConfigV1;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Authenticator, document store and OAuth descriptors.
    pub backend: Arc<Backend>,
    /// Who is currently signed in to this client.
    pub session: SessionStore,
}
