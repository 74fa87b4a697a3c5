use async_trait::async_trait;
use serde_json::Value;

use super::{Document, DocumentStore};
use crate::error::StoreError;

/// A no-op store that always returns an error if called,
/// indicating the store is disabled.
pub struct NoStore;

impl NoStore {
    pub fn new() -> Self {
        NoStore
    }
}

impl Default for NoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for NoStore {
    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Disabled)
    }

    async fn list(&self, _collection: &str) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Disabled)
    }

    async fn put(&self, _collection: &str, _id: &str, _data: Value) -> Result<(), StoreError> {
        Err(StoreError::Disabled)
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Disabled)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
