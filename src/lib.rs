//! Library exports for sessionkeeper, shared between the binary and tests.

pub mod authenticators;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
