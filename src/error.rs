//! Error types for the authenticator, document store and backend seams.
//!
//! The session register itself cannot fail and has no error type.

use thiserror::Error;

/// Failures reported by an [`Authenticator`](crate::authenticators::Authenticator).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("malformed credentials: {0}")]
    MalformedCredentials(String),
    #[error("authenticator '{0}' timed out")]
    Timeout(String),
    #[error("sign-in is not supported by authenticator '{0}'")]
    Unsupported(String),
}

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store is disabled")]
    Disabled,
    #[error("document '{collection}/{id}' not found")]
    NotFound { collection: String, id: String },
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Failures while initialising the backend handles from configuration.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend option '{0}' must not be empty")]
    MissingField(&'static str),
    #[error("store is enabled but no backend is configured")]
    MissingStoreBackend,
    #[error(transparent)]
    Store(#[from] StoreError),
}
