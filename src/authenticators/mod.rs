pub mod base;
pub mod no_authenticator;
pub mod plain_authenticator;

// Re-export the primary items so code outside can do
// "use crate::authenticators::{Authenticator, create_authenticator};"
pub use base::*;
