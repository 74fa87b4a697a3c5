use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Authenticator, SessionListener, SessionListeners};
use crate::error::AuthError;
use crate::models::Principal;

fn default_provider_id() -> String {
    "password".to_string()
}

/// PlainAuthenticatorConfig defines locally configured identities.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct PlainAuthenticatorConfig {
    /// A friendly name for logs.
    pub name: String,
    /// Provider id stamped on every principal this authenticator signs in.
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    pub users: Vec<PlainUserEntry>,
    /// uid of a user that is already signed in when the client starts.
    #[serde(default)]
    pub signed_in: Option<String>,
}

/// A single identity: uid, email + password, optional display name.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct PlainUserEntry {
    pub uid: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// A `PlainAuthenticator` implements Basic sign-in by comparing
/// credentials to the user list in `PlainAuthenticatorConfig`.
pub struct PlainAuthenticator {
    pub config: PlainAuthenticatorConfig,
    current: Mutex<Option<Principal>>,
    listeners: SessionListeners,
}

impl PlainAuthenticator {
    /// Create a new `PlainAuthenticator` from the config struct.
    pub fn new(config: &PlainAuthenticatorConfig) -> Self {
        let current = config.signed_in.as_deref().and_then(|uid| {
            let found = config.users.iter().find(|entry| entry.uid == uid);
            if found.is_none() {
                warn!("Configured signed-in uid '{}' is not a known user", uid);
            }
            found.map(|entry| Self::principal_for(config, entry))
        });

        Self {
            config: config.clone(),
            current: Mutex::new(current),
            listeners: SessionListeners::new(),
        }
    }

    fn principal_for(config: &PlainAuthenticatorConfig, entry: &PlainUserEntry) -> Principal {
        let mut principal = Principal::new(entry.uid.clone())
            .with_email(entry.email.clone())
            .with_provider_id(config.provider_id.clone());
        principal.display_name = entry.display_name.clone();
        principal
    }

    /// Record the new session value and tell the listeners about it.
    fn report(&self, principal: Option<Principal>) {
        self.listeners.apply(|| {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            *current = principal.clone();
            principal
        });
    }

    /// Decode base64 "email:password" and look the pair up.
    fn verify(&self, credentials: &str) -> Result<Principal, AuthError> {
        let decoded_bytes = general_purpose::STANDARD.decode(credentials).map_err(|e| {
            warn!("Base64 decode error: {}", e);
            AuthError::MalformedCredentials("invalid base64 in Basic credentials".to_string())
        })?;

        let decoded_str = String::from_utf8(decoded_bytes).map_err(|e| {
            warn!("Invalid UTF-8 in Basic credentials: {}", e);
            AuthError::MalformedCredentials("invalid UTF-8 in Basic credentials".to_string())
        })?;

        let (email, password) = decoded_str.split_once(':').unwrap_or((decoded_str.as_str(), ""));
        if email.is_empty() {
            return Err(AuthError::MalformedCredentials(
                "no email in Basic credentials".to_string(),
            ));
        }

        debug!("Basic sign-in attempt for '{}'", email);
        self.config
            .users
            .iter()
            .find(|entry| entry.email == email && entry.password == password)
            .map(|entry| Self::principal_for(&self.config, entry))
            .ok_or(AuthError::InvalidCredentials)
    }
}

#[async_trait]
impl Authenticator for PlainAuthenticator {
    fn get_name(&self) -> &str {
        &self.config.name
    }

    fn get_type(&self) -> &str {
        "Basic"
    }

    fn current_principal(&self) -> Option<Principal> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A failed sign-in also ends any existing session.
    async fn sign_in(&self, credentials: &str) -> Result<Principal, AuthError> {
        match self.verify(credentials) {
            Ok(principal) => {
                info!("Signed in '{}' via '{}'", principal.uid, self.config.name);
                self.report(Some(principal.clone()));
                Ok(principal)
            }
            Err(e) => {
                warn!("Sign-in via '{}' failed: {}", self.config.name, e);
                self.report(None);
                Err(e)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        debug!("Signing out via '{}'", self.config.name);
        self.report(None);
        Ok(())
    }

    fn on_session_change(&self, listener: SessionListener) {
        self.listeners.add(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn create_test_config() -> PlainAuthenticatorConfig {
        PlainAuthenticatorConfig {
            name: "TestPlain".to_string(),
            provider_id: default_provider_id(),
            users: vec![
                PlainUserEntry {
                    uid: "u1".to_string(),
                    email: "ada@example.com".to_string(),
                    password: "lovelace".to_string(),
                    display_name: Some("Ada".to_string()),
                },
                PlainUserEntry {
                    uid: "u2".to_string(),
                    email: "grace@example.com".to_string(),
                    password: "p@ss:w0rd".to_string(),
                    display_name: None,
                },
            ],
            signed_in: None,
        }
    }

    fn basic(credentials: &str) -> String {
        general_purpose::STANDARD.encode(credentials)
    }

    fn record(authenticator: &PlainAuthenticator) -> Arc<Mutex<Vec<Option<String>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        authenticator.on_session_change(Box::new(move |p: Option<Principal>| {
            sink.lock().unwrap().push(p.map(|p| p.uid));
        }));
        seen
    }

    #[tokio::test]
    async fn test_sign_in_valid_credentials() {
        let authenticator = PlainAuthenticator::new(&create_test_config());

        let principal = authenticator
            .sign_in(&basic("ada@example.com:lovelace"))
            .await
            .unwrap();

        assert_eq!(principal.uid, "u1");
        assert_eq!(principal.display_name.as_deref(), Some("Ada"));
        assert_eq!(principal.email.as_deref(), Some("ada@example.com"));
        assert_eq!(principal.provider_id.as_deref(), Some("password"));
        assert_eq!(authenticator.current_principal(), Some(principal));
    }

    #[tokio::test]
    async fn test_password_may_contain_colon() {
        let authenticator = PlainAuthenticator::new(&create_test_config());
        let principal = authenticator
            .sign_in(&basic("grace@example.com:p@ss:w0rd"))
            .await
            .unwrap();
        assert_eq!(principal.uid, "u2");
    }

    #[tokio::test]
    async fn test_wrong_password_signs_out() {
        let authenticator = PlainAuthenticator::new(&create_test_config());
        let seen = record(&authenticator);

        authenticator
            .sign_in(&basic("ada@example.com:lovelace"))
            .await
            .unwrap();
        let res = authenticator.sign_in(&basic("ada@example.com:wrong")).await;

        assert_eq!(res, Err(AuthError::InvalidCredentials));
        assert!(authenticator.current_principal().is_none());
        assert_eq!(*seen.lock().unwrap(), vec![Some("u1".to_string()), None]);
    }

    #[tokio::test]
    async fn test_invalid_base64_is_malformed() {
        let authenticator = PlainAuthenticator::new(&create_test_config());
        let res = authenticator.sign_in("not base64!!").await;
        assert!(matches!(res, Err(AuthError::MalformedCredentials(_))));
    }

    #[tokio::test]
    async fn test_missing_email_is_malformed() {
        let authenticator = PlainAuthenticator::new(&create_test_config());
        let res = authenticator.sign_in(&basic(":lovelace")).await;
        assert!(matches!(res, Err(AuthError::MalformedCredentials(_))));
    }

    #[tokio::test]
    async fn test_sign_out_notifies_listeners() {
        let authenticator = PlainAuthenticator::new(&create_test_config());
        let seen = record(&authenticator);

        authenticator
            .sign_in(&basic("grace@example.com:p@ss:w0rd"))
            .await
            .unwrap();
        authenticator.sign_out().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some("u2".to_string()), None]);
        assert!(authenticator.current_principal().is_none());
    }

    #[test]
    fn test_configured_signed_in_user_is_reported_at_startup() {
        let mut config = create_test_config();
        config.signed_in = Some("u2".to_string());
        let authenticator = PlainAuthenticator::new(&config);
        assert_eq!(
            authenticator.current_principal().map(|p| p.uid),
            Some("u2".to_string())
        );
    }

    #[test]
    fn test_unknown_signed_in_user_is_ignored() {
        let mut config = create_test_config();
        config.signed_in = Some("ghost".to_string());
        let authenticator = PlainAuthenticator::new(&config);
        assert!(authenticator.current_principal().is_none());
    }
}
