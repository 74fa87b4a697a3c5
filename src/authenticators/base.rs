use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{
    no_authenticator::NoAuthenticator,
    plain_authenticator::{PlainAuthenticator, PlainAuthenticatorConfig},
};
use crate::error::AuthError;
use crate::models::Principal;

/// Configuration for the authenticator backing the client session.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "type")]
pub enum AuthenticatorConfig {
    #[serde(rename = "plain")]
    Plain(PlainAuthenticatorConfig),
    #[serde(rename = "none")]
    Disabled,
}

/// Listener invoked by an authenticator on every session change.
pub type SessionListener = Box<dyn Fn(Option<Principal>) + Send + Sync>;

/// The authentication collaborator of the session.
///
/// An authenticator owns the sign-in protocol. It reports the principal it
/// considers signed in synchronously through `current_principal` and reports
/// every later change, including failures (as `None`), to its listeners.
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn get_name(&self) -> &str;
    fn get_type(&self) -> &str;
    fn current_principal(&self) -> Option<Principal>;
    async fn sign_in(&self, credentials: &str) -> Result<Principal, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    fn on_session_change(&self, listener: SessionListener);
}

/// Create an authenticator from a given config.
pub fn create_authenticator(config: &AuthenticatorConfig) -> Box<dyn Authenticator> {
    match config {
        AuthenticatorConfig::Plain(cfg) => Box::new(PlainAuthenticator::new(cfg)),
        AuthenticatorConfig::Disabled => {
            info!("Authenticator is disabled. Using NoAuthenticator.");
            Box::new(NoAuthenticator::new())
        }
    }
}

/// Signs in through `authenticator`, giving up after `limit`.
///
/// A timed out sign-in is a failed sign-in: the authenticator is asked to
/// sign out so its listeners observe the signed-out state.
pub async fn sign_in_with_timeout(
    authenticator: &dyn Authenticator,
    credentials: &str,
    limit: Duration,
) -> Result<Principal, AuthError> {
    match timeout(limit, authenticator.sign_in(credentials)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Authenticator '{}' timed out after {}ms",
                authenticator.get_name(),
                limit.as_millis()
            );
            if let Err(e) = authenticator.sign_out().await {
                debug!("Sign-out after timeout failed: {}", e);
            }
            Err(AuthError::Timeout(authenticator.get_name().to_string()))
        }
    }
}

/// Ordered list of session listeners shared by authenticator implementations.
///
/// Listeners run without any lock held, so a listener may call back into the
/// authenticator (sign out, register another listener). Changes reported while
/// a delivery is running are queued and delivered in order by that delivery.
#[derive(Default)]
pub struct SessionListeners {
    inner: Mutex<ListenerQueue>,
}

#[derive(Default)]
struct ListenerQueue {
    listeners: Vec<Arc<dyn Fn(Option<Principal>) + Send + Sync>>,
    pending: VecDeque<Option<Principal>>,
    delivering: bool,
}

impl SessionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: SessionListener) {
        self.lock().listeners.push(Arc::from(listener));
    }

    /// Runs `update` and notifies every listener with its result.
    ///
    /// `update` runs under the queue lock, so changes are queued in the order
    /// they were applied. If another call is already delivering, the change is
    /// left to it and this returns immediately.
    pub fn apply<F>(&self, update: F)
    where
        F: FnOnce() -> Option<Principal>,
    {
        {
            let mut queue = self.lock();
            let principal = update();
            queue.pending.push_back(principal);
            if queue.delivering {
                return;
            }
            queue.delivering = true;
        }

        let _guard = ListenerGuard { owner: self };
        loop {
            let (principal, listeners) = {
                let mut queue = self.lock();
                match queue.pending.pop_front() {
                    Some(principal) => (principal, queue.listeners.clone()),
                    None => {
                        queue.delivering = false;
                        return;
                    }
                }
            };
            for listener in listeners {
                listener(principal.clone());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, ListenerQueue> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the delivering flag when a listener panics.
struct ListenerGuard<'a> {
    owner: &'a SessionListeners,
}

impl Drop for ListenerGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut queue = self.owner.lock();
            queue.pending.clear();
            queue.delivering = false;
        }
    }
}
