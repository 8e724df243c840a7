//! Storage service implementation using Apache OpenDAL.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use opendal::{Operator, services};
use rand::Rng;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::{DELETE_BATCH_SIZE, ObjectStore};

/// Storage service for file attachments.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Validate an upload against the configured size bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is too large.
    pub fn validate_size(&self, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }
        Ok(())
    }

    /// Check if an object exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.exists(key).await.unwrap_or(false)
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.validate_size(bytes.len() as u64)?;
        self.operator
            .write_with(key, bytes)
            .content_type(content_type)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        // OpenDAL delete is idempotent: an absent key is Ok.
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.len() > DELETE_BATCH_SIZE {
            return Err(StorageError::operation(format!(
                "batch of {} keys exceeds the bulk-delete bound of {DELETE_BATCH_SIZE}",
                keys.len()
            )));
        }
        self.operator
            .delete_iter(keys.iter().cloned())
            .await
            .map_err(StorageError::from)
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.config.public_url)
    }
}

/// Generate a storage key for an upload.
///
/// Format: `{folder}/{year}/{month}/{epoch-ms}-{suffix}-{sanitized-filename}`
#[must_use]
pub fn object_key(folder: &str, filename: &str, now: DateTime<Utc>, suffix: &str) -> String {
    format!(
        "{}/{}/{:02}/{}-{}-{}",
        folder,
        now.year(),
        now.month(),
        now.timestamp_millis(),
        suffix,
        sanitize_filename(filename)
    )
}

/// Generate the random 6-character key suffix.
#[must_use]
pub fn random_suffix() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..6)
        .map(|_| char::from(CHARSET[rng.random_range(0..CHARSET.len())]))
        .collect()
}

/// Sanitize a filename for use in a storage key.
///
/// Strips every character outside `[A-Za-z0-9.-]`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "myfile1.pdf");
        assert_eq!(sanitize_filename("test@#$%.doc"), "test.doc");
        assert_eq!(sanitize_filename("日本語.pdf"), ".pdf");
        assert_eq!(sanitize_filename("with-dash_and_underscore"), "with-dashandunderscore");
    }

    #[test]
    fn test_object_key_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let key = object_key("karma", "my receipt.png", now, "a1b2c3");
        assert_eq!(
            key,
            format!("karma/2026/03/{}-a1b2c3-myreceipt.png", now.timestamp_millis())
        );
    }

    #[test]
    fn test_object_key_parts() {
        let now = Utc.with_ymd_and_hms(2026, 11, 30, 23, 59, 59).unwrap();
        let key = object_key("karma", "invoice.pdf", now, "zzz999");

        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "karma");
        assert_eq!(parts[1], "2026");
        assert_eq!(parts[2], "11");

        let name_parts: Vec<&str> = parts[3].splitn(3, '-').collect();
        assert!(name_parts[0].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(name_parts[1], "zzz999");
        assert_eq!(name_parts[2], "invoice.pdf");
    }

    #[test]
    fn test_random_suffix_shape() {
        for _ in 0..32 {
            let suffix = random_suffix();
            assert_eq!(suffix.len(), 6);
            assert!(
                suffix
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn test_validate_size() {
        let config = StorageConfig::new(StorageProvider::local_fs("./test"), "http://localhost")
            .with_max_file_size(1024);
        let service = StorageService::from_config(config).expect("should create service");

        assert!(service.validate_size(512).is_ok());
        let err = service.validate_size(2048).unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { .. }));
    }

    #[test]
    fn test_url_for() {
        let config = StorageConfig::new(
            StorageProvider::local_fs("./test"),
            "https://img.example.com/",
        );
        let service = StorageService::from_config(config).expect("should create service");
        assert_eq!(
            service.url_for("karma/2026/01/1-a-b.png"),
            "https://img.example.com/karma/2026/01/1-a-b.png"
        );
    }

    #[tokio::test]
    async fn test_local_fs_put_delete_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig::new(
            StorageProvider::local_fs(dir.path()),
            "http://localhost/files",
        );
        let service = StorageService::from_config(config).expect("should create service");

        let key = object_key("karma", "note.txt", Utc::now(), &random_suffix());
        service
            .put(&key, b"hello".to_vec(), "text/plain")
            .await
            .expect("put");
        assert!(service.exists(&key).await);

        service.delete(&key).await.expect("delete");
        assert!(!service.exists(&key).await);

        // Deleting an already-deleted key does not error.
        service.delete(&key).await.expect("idempotent delete");
    }

    #[tokio::test]
    async fn test_delete_batch_rejects_oversized_chunk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig::new(
            StorageProvider::local_fs(dir.path()),
            "http://localhost/files",
        );
        let service = StorageService::from_config(config).expect("should create service");

        let keys: Vec<String> = (0..=DELETE_BATCH_SIZE).map(|i| format!("k/{i}")).collect();
        let err = service.delete_batch(&keys).await.unwrap_err();
        assert!(matches!(err, StorageError::Operation(_)));
    }
}
