//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - The admin allowlist check

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use karma_core::identity::{Identity, IdentityService, TokenVerifier};
use karma_core::storage::StorageService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Bearer-token verifier.
    pub verifier: Arc<dyn TokenVerifier>,
    /// Auth-service admin client.
    pub identity: Arc<IdentityService>,
    /// Storage service for file attachments (optional).
    pub storage: Option<Arc<StorageService>>,
    /// Lowercased emails allowed to use the admin API.
    pub admin_emails: Vec<String>,
    /// Key prefix for uploaded objects.
    pub upload_folder: String,
}

impl AppState {
    /// Whether a verified identity is on the admin allowlist.
    #[must_use]
    pub fn is_admin(&self, identity: &Identity) -> bool {
        identity
            .email_lowercase()
            .is_some_and(|email| self.admin_emails.contains(&email))
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
