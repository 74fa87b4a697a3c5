use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Connection options of the hosted backend project.
///
/// These identify the project to the platform; they are supplied by the
/// hosting application's configuration and never compiled in.
#[derive(Deserialize, Serialize, JsonSchema, Clone)]
pub struct BackendConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    /// Optional analytics measurement id.
    pub measurement_id: Option<String>,
}

impl BackendConfig {
    /// Checks the options needed to address the project are present.
    pub fn validate(&self) -> Result<(), BackendError> {
        let required = [
            ("api_key", &self.api_key),
            ("project_id", &self.project_id),
            ("app_id", &self.app_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(BackendError::MissingField(name));
            }
        }
        Ok(())
    }
}

// The api key must not end up in logs.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_key", &"<redacted>")
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("measurement_id", &self.measurement_id)
            .finish()
    }
}
