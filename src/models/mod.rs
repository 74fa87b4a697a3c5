pub mod oauth_provider;
pub mod principal;

pub use oauth_provider::OAuthProvider;
pub use principal::{Principal, SessionState};
