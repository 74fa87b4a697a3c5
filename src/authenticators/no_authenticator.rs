use async_trait::async_trait;

use super::{Authenticator, SessionListener};
use crate::error::AuthError;
use crate::models::Principal;

/// An authenticator that never signs anybody in. The session stays anonymous.
pub struct NoAuthenticator;

impl NoAuthenticator {
    pub fn new() -> Self {
        NoAuthenticator
    }
}

impl Default for NoAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for NoAuthenticator {
    fn get_name(&self) -> &str {
        "none"
    }

    fn get_type(&self) -> &str {
        "None"
    }

    fn current_principal(&self) -> Option<Principal> {
        None
    }

    async fn sign_in(&self, _credentials: &str) -> Result<Principal, AuthError> {
        Err(AuthError::Unsupported(self.get_name().to_string()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    // Nothing ever changes, so listeners are never called.
    fn on_session_change(&self, _listener: SessionListener) {}
}
