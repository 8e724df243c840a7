//! Admin user management routes.
//!
//! Every operation requires a verified identity whose email is on the
//! admin allowlist. Account removal comes in two strengths: PATCH
//! revokes access and purges the user's data but keeps the sign-in
//! identity; DELETE additionally removes the identity itself.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use karma_core::attachment::{AttachmentCoordinator, CleanupReport};
use karma_core::identity::{Identity, NewUser, UserUpdate};
use karma_db::repositories::{PurgeSummary, RecordRepository, UserDataRepository};

/// Creates the admin user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin-users", get(list_users))
        .route("/api/admin-users", post(create_user))
        .route("/api/admin-users", put(update_user))
        .route("/api/admin-users", delete(delete_user))
        .route("/api/admin-users", patch(revoke_user))
}

/// Rejects callers who are not on the admin allowlist.
fn require_admin(state: &AppState, user: &AuthUser) -> Result<Identity, ApiError> {
    if state.is_admin(&user.0) {
        Ok(user.0.clone())
    } else {
        warn!(user_id = %user.0.id, "admin API access denied");
        Err(ApiError::forbidden("Access denied: admin only"))
    }
}

async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &user)?;

    let users = state.identity.list_users().await?;
    Ok(Json(json!({ "users": users })))
}

/// Request body for account creation.
#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    email: Option<String>,
    password: Option<String>,
}

async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &user)?;

    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let created = state
        .identity
        .create_user(&NewUser {
            email: email.clone(),
            password,
        })
        .await?;

    // The new account can sign in right away.
    UserDataRepository::new((*state.db).clone())
        .authorize(created.id, &email)
        .await?;

    info!(user_id = %created.id, "account created");
    Ok((StatusCode::CREATED, Json(json!({ "user": created }))))
}

/// Request body for account updates.
#[derive(Debug, Deserialize)]
struct UpdateUserRequest {
    #[serde(rename = "userId")]
    user_id: Option<Uuid>,
    email: Option<String>,
    password: Option<String>,
}

async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &user)?;

    let Some(id) = request.user_id else {
        return Err(ApiError::bad_request("User id is required"));
    };
    let update = UserUpdate {
        email: request.email,
        password: request.password,
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let updated = state.identity.update_user(id, &update).await?;
    info!(user_id = %id, "account updated");
    Ok(Json(json!({ "user": updated })))
}

/// Request body for both removal variants.
#[derive(Debug, Deserialize)]
struct RemoveUserRequest {
    #[serde(rename = "userId")]
    user_id: Option<Uuid>,
    #[serde(default)]
    action: Option<String>,
}

async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RemoveUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &user)?;

    let Some(id) = request.user_id else {
        return Err(ApiError::bad_request("User id is required"));
    };

    let (report, summary) = cleanup_user_data(&state, id).await?;
    state.identity.delete_user(id).await?;

    info!(user_id = %id, "account fully deleted");
    Ok(Json(json!({
        "success": true,
        "attachments": { "attempted": report.attempted, "failed": report.failed },
        "rows_removed": summary.total(),
    })))
}

async fn revoke_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RemoveUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &user)?;

    if request.action.as_deref() != Some("revoke") {
        return Err(ApiError::bad_request("Unsupported action"));
    }
    let Some(id) = request.user_id else {
        return Err(ApiError::bad_request("User id is required"));
    };

    let (report, summary) = cleanup_user_data(&state, id).await?;

    info!(user_id = %id, "account access revoked");
    Ok(Json(json!({
        "success": true,
        "attachments": { "attempted": report.attempted, "failed": report.failed },
        "rows_removed": summary.total(),
    })))
}

/// Removes everything a user owns: stored attachment objects first
/// (best-effort, while the transaction rows still list their keys),
/// then the database records including the authorization row.
async fn cleanup_user_data(
    state: &AppState,
    user_id: Uuid,
) -> Result<(CleanupReport, PurgeSummary), ApiError> {
    let report = if let Some(storage) = &state.storage {
        let coordinator = AttachmentCoordinator::new(
            storage.clone(),
            Arc::new(RecordRepository::new((*state.db).clone())),
        );
        coordinator.purge_user_attachments(user_id).await
    } else {
        warn!(%user_id, "storage not configured, skipping attachment purge");
        CleanupReport::default()
    };

    let summary = UserDataRepository::new((*state.db).clone())
        .purge_records(user_id)
        .await?;

    Ok((report, summary))
}
