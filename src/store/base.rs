use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{memory_store::MemoryStore, mongodb_store::MongoDBStore, no_store::NoStore};
use crate::config::{StoreBackend, StoreConfig};
use crate::error::{BackendError, StoreError};

/// A structured record addressed by its id within a collection.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// The DocumentStore trait abstracts structured record persistence.
///
/// Records are JSON objects addressed by `(collection, id)`. No schema or
/// query model is imposed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
    /// Creates or replaces the record.
    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;
    /// Deletes the record, failing with `NotFound` if it does not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Stores `data` under a freshly generated id and returns the id.
    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.put(collection, &id, data).await?;
        Ok(id)
    }

    fn is_enabled(&self) -> bool {
        // Real stores are always enabled; NoStore overrides this
        true
    }
}

/// Creates a concrete store implementation based on the StoreConfig.
/// If `store.enabled = false`, returns NoStore. Otherwise, picks the specified backend.
/// `default_database` names the database when the backend config leaves it out.
pub async fn create_store(
    config: &StoreConfig,
    default_database: &str,
) -> Result<Arc<dyn DocumentStore>, BackendError> {
    if !config.enabled {
        info!("Document store is disabled. Using NoStore.");
        return Ok(Arc::new(NoStore::new()));
    }

    match &config.backend {
        Some(StoreBackend::Memory) => {
            info!("Using in-memory document store.");
            Ok(Arc::new(MemoryStore::new()))
        }
        Some(StoreBackend::MongoDB(mongo_config)) => {
            let store = MongoDBStore::new(mongo_config, default_database).await?;
            info!("Successfully created MongoDB store.");
            Ok(Arc::new(store))
        }
        None => Err(BackendError::MissingStoreBackend),
    }
}

/// Rejects empty path segments and segments containing '/'.
pub fn validate_path(collection: &str, id: &str) -> Result<(), StoreError> {
    for (what, segment) in [("collection", collection), ("id", id)] {
        if segment.is_empty() || segment.contains('/') {
            return Err(StoreError::InvalidDocument(format!(
                "{} '{}' must be non-empty and must not contain '/'",
                what, segment
            )));
        }
    }
    Ok(())
}

/// Records must be JSON objects.
pub fn validate_data(data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(
            "document data must be a JSON object".to_string(),
        ))
    }
}
