pub mod base;
pub mod memory_store;
pub mod mongodb_store;
pub mod no_store;

// Re-export the primary items so code outside can do
// "use crate::store::{DocumentStore, create_store};"
pub use base::{create_store, validate_data, validate_path, Document, DocumentStore};
