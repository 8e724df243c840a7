//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod admin_users;
pub mod debug;
pub mod health;
pub mod uploads;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Admin routes require a verified identity; the allowlist check
    // happens inside the handlers.
    let protected_routes = admin_users::routes().layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .merge(health::routes())
        .merge(uploads::routes())
        .merge(debug::routes())
        .merge(protected_routes)
}
