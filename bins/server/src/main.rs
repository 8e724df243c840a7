//! Karma API Server
//!
//! Main entry point for the Karma backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use karma_api::{AppState, create_router};
use karma_core::identity::IdentityService;
use karma_core::storage::{StorageConfig, StorageProvider, StorageService};
use karma_db::connect;
use karma_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karma=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Auth service client; it is both the token verifier and the admin client
    let identity = Arc::new(IdentityService::new(
        config.auth.url.clone(),
        config.auth.service_key.clone(),
    ));
    let admin_emails = config.auth.admin_email_list();
    info!(
        auth_url = %config.auth.url,
        admins = admin_emails.len(),
        "Auth service configured"
    );

    // Object storage is optional; without it uploads return 503
    let mut upload_folder = "karma".to_string();
    let storage = match &config.storage {
        Some(settings) => {
            upload_folder.clone_from(&settings.folder);
            let provider = StorageProvider::s3(
                &settings.endpoint,
                &settings.bucket,
                &settings.access_key_id,
                &settings.secret_access_key,
                &settings.region,
            );
            let service =
                StorageService::from_config(StorageConfig::new(provider, &settings.public_url))?;
            info!(bucket = %settings.bucket, "Storage service configured");
            Some(Arc::new(service))
        }
        None => {
            warn!("Storage not configured; attachment endpoints will be unavailable");
            None
        }
    };

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        verifier: identity.clone(),
        identity,
        storage,
        admin_emails,
        upload_folder,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
