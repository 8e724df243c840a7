//! Router-level tests over the full middleware and route stack.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use karma_api::{AppState, create_router};
use karma_core::identity::{Identity, IdentityError, IdentityService, TokenVerifier};
use karma_core::storage::{StorageConfig, StorageProvider, StorageService};

struct StubVerifier(Option<Identity>);

#[async_trait]
impl TokenVerifier for StubVerifier {
    async fn verify_token(&self, _token: &str) -> Result<Identity, IdentityError> {
        self.0.clone().ok_or(IdentityError::Unauthenticated)
    }
}

fn identity(email: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
    }
}

fn state(
    verifier: StubVerifier,
    storage: Option<Arc<StorageService>>,
) -> AppState {
    AppState {
        db: Arc::new(DatabaseConnection::default()),
        verifier: Arc::new(verifier),
        identity: Arc::new(IdentityService::new("http://127.0.0.1:1", "test-service-key")),
        storage,
        admin_emails: vec!["admin@example.com".to_string()],
        upload_folder: "karma".to_string(),
    }
}

fn local_storage(dir: &std::path::Path) -> Arc<StorageService> {
    let config = StorageConfig::new(
        StorageProvider::local_fs(dir),
        "http://localhost/files",
    );
    Arc::new(StorageService::from_config(config).expect("local storage"))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = create_router(state(StubVerifier(None), None));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "karma");
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let app = create_router(state(StubVerifier(None), None));
    let response = app
        .oneshot(
            Request::get("/api/admin-users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let app = create_router(state(StubVerifier(None), None));
    let response = app
        .oneshot(
            Request::get("/api/admin-users")
                .header(header::AUTHORIZATION, "Bearer bogus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest::rstest]
#[case("GET")]
#[case("POST")]
#[case("PUT")]
#[case("DELETE")]
#[case("PATCH")]
#[tokio::test]
async fn non_admin_is_forbidden_for_every_method(#[case] method: &str) {
    // Disconnected database: a 403 proves the allowlist check fires first.
    let app = create_router(state(
        StubVerifier(Some(identity("user@example.com"))),
        None,
    ));
    let request = if method == "GET" {
        Request::get("/api/admin-users")
            .header(header::AUTHORIZATION, "Bearer token")
            .body(Body::empty())
            .unwrap()
    } else {
        Request::builder()
            .method(method)
            .uri("/api/admin-users")
            .header(header::AUTHORIZATION, "Bearer token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "userId": Uuid::new_v4() }).to_string()))
            .unwrap()
    };
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Access denied: admin only");
}

#[tokio::test]
async fn admin_email_comparison_ignores_case() {
    let app = create_router(state(
        StubVerifier(Some(identity("Admin@Example.COM"))),
        None,
    ));
    // Bad action fails validation, which only admins reach.
    let response = app
        .oneshot(
            Request::patch("/api/admin-users")
                .header(header::AUTHORIZATION, "Bearer token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "userId": Uuid::new_v4(), "action": "suspend" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Unsupported action");
}

#[tokio::test]
async fn update_requires_an_id() {
    let app = create_router(state(
        StubVerifier(Some(identity("admin@example.com"))),
        None,
    ));
    let response = app
        .oneshot(
            Request::put("/api/admin-users")
                .header(header::AUTHORIZATION, "Bearer token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "email": "x@example.com" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_accepts_the_user_id_field() {
    // Validation passes and the request reaches the (unreachable) auth
    // service, so the failure is upstream, never a 400.
    let app = create_router(state(
        StubVerifier(Some(identity("admin@example.com"))),
        None,
    ));
    let response = app
        .oneshot(
            Request::put("/api/admin-users")
                .header(header::AUTHORIZATION, "Bearer token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "userId": Uuid::new_v4(), "email": "new@example.com" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn create_requires_email_and_password() {
    let app = create_router(state(
        StubVerifier(Some(identity("admin@example.com"))),
        None,
    ));
    let response = app
        .oneshot(
            Request::post("/api/admin-users")
                .header(header::AUTHORIZATION, "Bearer token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "email": "x@example.com" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Email and password are required");
}

#[tokio::test]
async fn upload_without_storage_is_unavailable() {
    let app = create_router(state(StubVerifier(None), None));
    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nabc\r\n--{boundary}--\r\n"
    );
    let response = app
        .oneshot(
            Request::post("/api/r2-upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error"], "storage_not_configured");
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn upload_without_a_file_field_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(state(StubVerifier(None), Some(local_storage(dir.path()))));
    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );
    let response = app
        .oneshot(
            Request::post("/api/r2-upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn upload_then_delete_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = local_storage(dir.path());
    let app_state = state(StubVerifier(None), Some(storage.clone()));

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"my receipt.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
    );
    let response = create_router(app_state.clone())
        .oneshot(
            Request::post("/api/r2-upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uploaded = body_json(response).await;
    let key = uploaded["key"].as_str().unwrap().to_string();
    assert!(key.starts_with("karma/"));
    assert!(key.ends_with("myreceipt.png"));
    assert_eq!(
        uploaded["url"].as_str().unwrap(),
        format!("http://localhost/files/{key}")
    );
    assert!(storage.exists(&key).await);

    // Delete it, then delete it again: both report success.
    for _ in 0..2 {
        let response = create_router(app_state.clone())
            .oneshot(
                Request::post("/api/r2-delete")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "key": key }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["deleted"], key.as_str());
    }
    assert!(!storage.exists(&key).await);
}

#[tokio::test]
async fn upload_honors_the_folder_field() {
    let dir = tempfile::tempdir().unwrap();
    let storage = local_storage(dir.path());
    let app = create_router(state(StubVerifier(None), Some(storage.clone())));

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\navatars\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
    );
    let response = app
        .oneshot(
            Request::post("/api/r2-upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uploaded = body_json(response).await;
    let key = uploaded["key"].as_str().unwrap();
    assert!(key.starts_with("avatars/"));
    assert!(key.ends_with("me.png"));
    assert!(storage.exists(key).await);
}

#[tokio::test]
async fn delete_requires_a_key() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(state(StubVerifier(None), Some(local_storage(dir.path()))));
    let response = app
        .oneshot(
            Request::post("/api/r2-delete")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "key": "  " }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "No key provided");
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = create_router(state(StubVerifier(None), None));
    let response = app
        .oneshot(
            Request::get("/api/r2-upload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn debug_auth_reports_without_leaking_the_service_key() {
    let app = create_router(state(StubVerifier(None), None));
    let response = app
        .oneshot(
            Request::get("/api/debug-auth")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["token"]["present"], false);
    assert_eq!(body["identity"]["authenticated"], false);
    assert_eq!(body["storage"]["configured"], false);
    assert_eq!(body["admin_allowlist_size"], 1);
    // 16-char test key fits inside the preview window, but the endpoint
    // only ever reports preview plus length.
    assert_eq!(body["auth_service"]["service_key_length"], 16);
    assert!(
        body["auth_service"]["url_preview"]
            .as_str()
            .unwrap()
            .starts_with("http://127.0.0.1:1")
    );
}
