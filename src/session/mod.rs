//! The client session: who is currently signed in.
//!
//! [`SessionStore`] is the single source of truth for the current
//! [`Principal`](crate::models::Principal). It is mutated only through
//! `set`, normally by the authenticator listener installed by
//! [`bind_session`].

mod binding;
mod store;

pub use binding::bind_session;
pub use store::{SessionCallback, SessionStore, SubscriberId, Subscription, WeakSessionStore};
