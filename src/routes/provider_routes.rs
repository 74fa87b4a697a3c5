//! OAuth provider information endpoints.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Registers provider information routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/providers", get(list_providers))
}

/// Lists the configured OAuth descriptors without their custom parameters.
async fn list_providers(State(state): State<AppState>) -> Json<Value> {
    let providers: Vec<Value> = state
        .backend
        .oauth_providers()
        .iter()
        .map(|provider| {
            json!({
                "provider_id": provider.provider_id,
                "name": provider.name,
                "scopes": provider.scopes,
            })
        })
        .collect();
    Json(json!({ "providers": providers }))
}
