//! Document endpoints. All of them require a signed-in session.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::state::AppState;
use crate::store::Document;
use crate::utils::http_helpers::{HTTPError, SignedIn};

/// Registers document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/documents/{collection}",
            get(list_documents).post(add_document),
        )
        .route(
            "/documents/{collection}/{id}",
            get(get_document).put(put_document).delete(delete_document),
        )
}

async fn list_documents(
    SignedIn(_principal): SignedIn,
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Value>, HTTPError> {
    let documents = state.backend.db.list(&collection).await?;
    Ok(Json(json!({ "documents": documents })))
}

async fn add_document(
    SignedIn(principal): SignedIn,
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<Value>), HTTPError> {
    let id = state.backend.db.add(&collection, data).await?;
    info!(uid = %principal.uid, "Added document {}/{}", collection, id);
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_document(
    SignedIn(_principal): SignedIn,
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Document>, HTTPError> {
    match state.backend.db.get(&collection, &id).await? {
        Some(document) => Ok(Json(document)),
        None => Err(HTTPError::new(
            StatusCode::NOT_FOUND,
            format!("document '{}/{}' not found", collection, id),
        )),
    }
}

async fn put_document(
    SignedIn(principal): SignedIn,
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(data): Json<Value>,
) -> Result<StatusCode, HTTPError> {
    state.backend.db.put(&collection, &id, data).await?;
    info!(uid = %principal.uid, "Stored document {}/{}", collection, id);
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_document(
    SignedIn(principal): SignedIn,
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, HTTPError> {
    state.backend.db.delete(&collection, &id).await?;
    info!(uid = %principal.uid, "Deleted document {}/{}", collection, id);
    Ok(StatusCode::NO_CONTENT)
}
