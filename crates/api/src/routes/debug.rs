//! Authentication diagnostics endpoint.
//!
//! Reports what the server can see: whether a token arrived, whether
//! the auth service and storage are configured, and whether outbound
//! connectivity works. Secrets are shown as short previews only.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    routing::get,
};
use serde_json::{Value, json};

use crate::{AppState, middleware::auth::extract_bearer_token};

/// Creates the diagnostics routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/debug-auth", get(debug_auth))
}

async fn debug_auth(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    let (key_preview, key_length) = state.identity.service_key_hint();

    let identity = match token {
        Some(token) => match state.verifier.verify_token(token).await {
            Ok(identity) => json!({
                "authenticated": true,
                "user_id": identity.id,
                "email": identity.email,
                "is_admin": state.is_admin(&identity),
            }),
            Err(e) => json!({ "authenticated": false, "reason": e.to_string() }),
        },
        None => json!({ "authenticated": false, "reason": "no bearer token" }),
    };

    let connectivity = match state.identity.connectivity_probe().await {
        Ok(status) => json!({ "reachable": true, "status": status }),
        Err(e) => json!({ "reachable": false, "error": e }),
    };

    Json(json!({
        "token": {
            "present": token.is_some(),
            "preview": token.map(|t| preview(t, 20)),
            "length": token.map(|t| t.chars().count()),
        },
        "auth_service": {
            "url_preview": preview(state.identity.base_url(), 30),
            "service_key_preview": key_preview,
            "service_key_length": key_length,
        },
        "admin_allowlist_size": state.admin_emails.len(),
        "storage": state.storage.as_ref().map_or_else(
            || json!({ "configured": false }),
            |s| json!({
                "configured": true,
                "provider": s.provider_name(),
                "bucket": s.bucket(),
            }),
        ),
        "connectivity": connectivity,
        "identity": identity,
    }))
}

/// First `max` characters, with an ellipsis when truncated.
fn preview(value: &str, max: usize) -> String {
    let head: String = value.chars().take(max).collect();
    if value.chars().count() > max {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("short", 20, "short")]
    #[case("exactly-twenty-chars", 20, "exactly-twenty-chars")]
    #[case("a-much-longer-token-value-here", 20, "a-much-longer-token-...")]
    fn preview_truncates(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(preview(input, max), expected);
    }

    #[test]
    fn preview_never_exceeds_the_bound_plus_ellipsis() {
        let secret = "x".repeat(500);
        let shown = preview(&secret, 20);
        assert_eq!(shown.chars().count(), 23);
        assert!(!shown.contains(&secret));
    }
}
