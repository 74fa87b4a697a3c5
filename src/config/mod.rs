// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod backend;
pub mod config;
pub mod logging;
pub mod store;

pub use backend::*;
pub use config::*;
pub use logging::*;
pub use store::*;
