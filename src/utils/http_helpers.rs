use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::{AuthError, StoreError};
use crate::models::Principal;
use crate::state::AppState;

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Converts our `HTTPError` into a JSON `{"error": ...}` response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<AuthError> for HTTPError {
    fn from(e: AuthError) -> Self {
        let status = match e {
            AuthError::InvalidCredentials | AuthError::MalformedCredentials(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AuthError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        };
        HTTPError::new(status, e.to_string())
    }
}

impl From<StoreError> for HTTPError {
    fn from(e: StoreError) -> Self {
        let status = match &e {
            StoreError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            StoreError::Backend(_) => {
                error!("Store error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        HTTPError::new(status, e.to_string())
    }
}

/// Extractor for handlers that need somebody signed in.
///
/// Reads the client session; rejects with 401 when it is anonymous.
pub struct SignedIn(pub Principal);

impl FromRequestParts<AppState> for SignedIn {
    type Rejection = HTTPError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.session.current().map(SignedIn).ok_or_else(|| {
            HTTPError::new(StatusCode::UNAUTHORIZED, "Nobody is signed in")
        })
    }
}
