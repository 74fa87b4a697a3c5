use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Static description of a federated identity provider.
///
/// This carries no flow of its own: an authenticator that supports
/// redirect or popup sign-in reads the scopes and parameters from here.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct OAuthProvider {
    /// Provider identifier, e.g. "google.com".
    pub provider_id: String,
    /// A friendly name for logs and the provider listing.
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub custom_parameters: HashMap<String, String>,
}

impl OAuthProvider {
    pub const GOOGLE_PROVIDER_ID: &'static str = "google.com";

    pub fn new(provider_id: impl Into<String>, name: impl Into<String>) -> Self {
        OAuthProvider {
            provider_id: provider_id.into(),
            name: name.into(),
            scopes: Vec::new(),
            custom_parameters: HashMap::new(),
        }
    }

    /// The Google descriptor used when no provider is configured.
    pub fn google() -> Self {
        Self::new(Self::GOOGLE_PROVIDER_ID, "Google")
    }

    /// Adds a scope, ignoring duplicates.
    pub fn add_scope(&mut self, scope: impl Into<String>) -> &mut Self {
        let scope = scope.into();
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Replaces the custom parameters sent along with the sign-in request.
    pub fn set_custom_parameters(&mut self, parameters: HashMap<String, String>) -> &mut Self {
        self.custom_parameters = parameters;
        self
    }
}
