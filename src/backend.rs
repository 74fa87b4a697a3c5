//! Backend initialisation.
//!
//! Validates the project options and derives the handles the rest of the
//! client works with: the authenticator, the document store and the OAuth
//! provider descriptors.

use std::sync::Arc;

use tracing::info;

use crate::authenticators::{create_authenticator, Authenticator};
use crate::config::{BackendConfig, ConfigV1};
use crate::error::BackendError;
use crate::models::OAuthProvider;
use crate::store::{create_store, DocumentStore};

/// Handles derived from the backend options.
pub struct Backend {
    pub options: BackendConfig,
    pub auth: Arc<dyn Authenticator>,
    pub db: Arc<dyn DocumentStore>,
    providers: Vec<OAuthProvider>,
}

impl Backend {
    pub async fn initialize(config: &ConfigV1) -> Result<Self, BackendError> {
        config.backend.validate()?;
        info!(
            project_id = %config.backend.project_id,
            auth_domain = %config.backend.auth_domain,
            "Initializing backend"
        );

        let auth: Arc<dyn Authenticator> = Arc::from(create_authenticator(&config.authenticator));
        info!(
            "Using authenticator '{}' ({})",
            auth.get_name(),
            auth.get_type()
        );

        let db = create_store(&config.store, &config.backend.project_id).await?;

        let providers = if config.providers.is_empty() {
            vec![OAuthProvider::google()]
        } else {
            config.providers.clone()
        };

        Ok(Backend {
            options: config.backend.clone(),
            auth,
            db,
            providers,
        })
    }

    /// The primary OAuth provider: the first configured one, Google by default.
    pub fn provider(&self) -> &OAuthProvider {
        // initialize never leaves the list empty
        &self.providers[0]
    }

    pub fn oauth_providers(&self) -> &[OAuthProvider] {
        &self.providers
    }

    pub fn oauth_provider(&self, provider_id: &str) -> Option<&OAuthProvider> {
        self.providers.iter().find(|p| p.provider_id == provider_id)
    }
}
