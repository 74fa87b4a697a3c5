use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The `Principal` struct describes the identity currently signed in,
/// as reported by an authenticator. All fields are opaque to the session core.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl Principal {
    /// Create a principal with only a unique identifier.
    pub fn new(uid: impl Into<String>) -> Self {
        Principal {
            uid: uid.into(),
            display_name: None,
            email: None,
            provider_id: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }
}

/// The two logical session states. `Authenticated` owns a copy of the principal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionState {
    Anonymous,
    Authenticated { principal: Principal },
}

impl SessionState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated { principal } => Some(principal),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

impl From<Option<Principal>> for SessionState {
    fn from(value: Option<Principal>) -> Self {
        match value {
            Some(principal) => SessionState::Authenticated { principal },
            None => SessionState::Anonymous,
        }
    }
}
