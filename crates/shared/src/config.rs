//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Hosted auth service configuration.
    pub auth: AuthServiceConfig,
    /// Object storage configuration (optional; uploads are disabled without it).
    #[serde(default)]
    pub storage: Option<StorageSettings>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// Hosted auth service configuration.
///
/// The service issues bearer tokens and owns the user records; Karma only
/// resolves tokens and drives the admin API with the service-role key.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthServiceConfig {
    /// Base URL of the auth service.
    pub url: String,
    /// Service-role key for privileged admin operations.
    pub service_key: String,
    /// Comma-separated admin email allow-list.
    #[serde(default)]
    pub admin_emails: String,
}

impl AuthServiceConfig {
    /// Returns the admin allow-list as lower-cased, trimmed entries.
    #[must_use]
    pub fn admin_email_list(&self) -> Vec<String> {
        self.admin_emails
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// Object storage settings (S3-compatible, e.g. Cloudflare R2).
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// S3 endpoint URL.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Region (R2 uses "auto").
    #[serde(default = "default_region")]
    pub region: String,
    /// Public base URL objects are served from.
    pub public_url: String,
    /// Default folder prefix for uploads.
    #[serde(default = "default_folder")]
    pub folder: String,
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_folder() -> String {
    "karma".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KARMA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
