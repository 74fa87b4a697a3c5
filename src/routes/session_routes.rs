//! Sign-in state endpoints.

use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use crate::authenticators::sign_in_with_timeout;
use crate::models::SessionState;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Registers session routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/session",
        get(current_session).post(sign_in).delete(sign_out),
    )
}

/// Returns who is currently signed in.
async fn current_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.session.state())
}

/// Splits an `Authorization` header into scheme and credentials.
fn split_authorization(headers: &HeaderMap) -> Result<(&str, &str), HTTPError> {
    let header = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(credentials), None) => Ok((scheme, credentials)),
        _ => Err(HTTPError::new(
            StatusCode::UNAUTHORIZED,
            "Missing or malformed Authorization header",
        )),
    }
}

/// Signs in through the authenticator using the `Authorization` header.
/// The session store is updated by the authenticator's change report.
async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionState>, HTTPError> {
    let (scheme, credentials) = split_authorization(&headers)?;
    let authenticator = state.backend.auth.as_ref();
    if !scheme.eq_ignore_ascii_case(authenticator.get_type()) {
        debug!(
            "Authorization scheme '{}' does not match authenticator type '{}'",
            scheme,
            authenticator.get_type()
        );
        return Err(HTTPError::new(
            StatusCode::UNAUTHORIZED,
            format!("Expected {} credentials", authenticator.get_type()),
        ));
    }

    let limit = Duration::from_millis(state.config.auth.timeout_in_ms);
    let principal = sign_in_with_timeout(authenticator, credentials, limit).await?;
    Ok(Json(SessionState::from(Some(principal))))
}

async fn sign_out(State(state): State<AppState>) -> Result<StatusCode, HTTPError> {
    state.backend.auth.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}
