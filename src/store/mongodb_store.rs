use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, ReplaceOptions};
use mongodb::{Client, Collection, Database};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{validate_data, validate_path, Document, DocumentStore};
use crate::error::StoreError;

/// The config struct for MongoDB connections.
/// The database defaults to the backend project id.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct MongoDBConfig {
    pub uri: String,
    pub database: Option<String>,
}

/// Document shape for storing records in MongoDB.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct RecordDocument {
    #[serde(rename = "_id")]
    id: String,
    data: Value,
}

impl From<RecordDocument> for Document {
    fn from(record: RecordDocument) -> Self {
        Document {
            id: record.id,
            data: record.data,
        }
    }
}

/// A concrete `DocumentStore` implementation that uses MongoDB.
///
/// Each record collection maps onto the MongoDB collection of the same name.
pub struct MongoDBStore {
    database: Database,
}

impl MongoDBStore {
    /// Creates a new `MongoDBStore` from the given config.
    pub async fn new(config: &MongoDBConfig, default_database: &str) -> Result<Self, StoreError> {
        info!("Connecting to MongoDB at URI: {}", config.uri);

        let mut client_options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to parse MongoDB URI: {}", e)))?;

        client_options.app_name = Some("sessionkeeper".to_string());

        let client = Client::with_options(client_options)
            .map_err(|e| StoreError::Backend(format!("Failed to create MongoDB client: {}", e)))?;

        let database_name = config.database.as_deref().unwrap_or(default_database);
        info!("MongoDB client ready, using database '{}'", database_name);

        Ok(Self {
            database: client.database(database_name),
        })
    }

    fn collection(&self, name: &str) -> Collection<RecordDocument> {
        self.database.collection::<RecordDocument>(name)
    }
}

#[async_trait]
impl DocumentStore for MongoDBStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        validate_path(collection, id)?;
        let record = self
            .collection(collection)
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to query document: {}", e)))?;
        Ok(record.map(Document::from))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        validate_path(collection, "_")?;
        let cursor = self
            .collection(collection)
            .find(None, None)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to query documents: {}", e)))?;
        let records: Vec<RecordDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to read documents: {}", e)))?;
        Ok(records.into_iter().map(Document::from).collect())
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        validate_path(collection, id)?;
        validate_data(&data)?;
        let record = RecordDocument {
            id: id.to_string(),
            data,
        };
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection(collection)
            .replace_one(doc! { "_id": id }, record, options)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to store document: {}", e)))?;
        debug!("Stored document {}/{}", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        validate_path(collection, id)?;
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to delete document: {}", e)))?;

        if result.deleted_count == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
