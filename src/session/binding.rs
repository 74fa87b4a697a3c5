use tracing::{debug, info};

use super::SessionStore;
use crate::authenticators::Authenticator;
use crate::models::Principal;

/// Connects `store` to `authenticator`.
///
/// The store is seeded with whatever the authenticator reports synchronously,
/// then every session change the authenticator reports is forwarded to
/// `SessionStore::set`. The listener holds a weak handle, so it becomes a
/// no-op once every clone of the store is dropped.
pub fn bind_session(authenticator: &dyn Authenticator, store: &SessionStore) {
    let initial = authenticator.current_principal();
    info!(
        "Binding session to authenticator '{}' (signed in: {})",
        authenticator.get_name(),
        initial.as_ref().map_or("none", |p| p.uid.as_str())
    );
    store.set(initial);

    let weak = store.downgrade();
    authenticator.on_session_change(Box::new(move |principal: Option<Principal>| {
        match weak.upgrade() {
            Some(store) => store.set(principal),
            None => debug!("Session store dropped, ignoring session change"),
        }
    }));
}
