//! Attachment upload and delete routes.
//!
//! These mirror what the web client calls directly: a multipart upload
//! that returns the storage key and public URL, and a key-addressed
//! delete that is idempotent.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ApiError};
use karma_core::storage::{ObjectStore, StorageError, object_key, random_suffix};

/// Multipart uploads may exceed the storage bound slightly with field
/// overhead; the storage service enforces the real limit.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/r2-upload", post(upload))
        .route("/api/r2-delete", post(delete_object))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let Some(storage) = &state.storage else {
        return Err(ApiError::storage_not_configured());
    };

    let mut folder = state.upload_folder.clone();
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            Some("folder") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                if !value.trim().is_empty() {
                    folder = value.trim().to_string();
                }
            }
            _ => {}
        }
    }

    let Some((filename, content_type, bytes)) = file else {
        return Err(ApiError::bad_request("No file provided"));
    };

    let key = object_key(&folder, &filename, Utc::now(), &random_suffix());
    storage
        .put(&key, bytes, &content_type)
        .await
        .map_err(|e| match e {
            StorageError::FileTooLarge { .. } => ApiError::bad_request(e.to_string()),
            _ => ApiError::internal(e.to_string()),
        })?;

    let url = storage.url_for(&key);
    info!(key, folder, "attachment uploaded");
    Ok(Json(json!({ "key": key, "url": url })))
}

/// Request body for key-addressed deletion.
#[derive(Debug, Deserialize)]
struct DeleteRequest {
    key: Option<String>,
}

async fn delete_object(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = match request.key {
        Some(key) if !key.trim().is_empty() => key,
        _ => return Err(ApiError::bad_request("No key provided")),
    };

    let Some(storage) = &state.storage else {
        return Err(ApiError::storage_not_configured());
    };

    // Deleting an absent key reports success; the outcome is the same.
    storage
        .delete(&key)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    info!(key, "attachment deleted");
    Ok(Json(json!({ "success": true, "deleted": key })))
}
