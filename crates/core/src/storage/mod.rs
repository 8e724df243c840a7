//! Object storage gateway.
//!
//! Wraps a key-addressed bucket store behind the [`ObjectStore`] trait so
//! the attachment coordinator and the client data store can be tested
//! without a live bucket. The production implementation is
//! [`StorageService`], built on Apache OpenDAL.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{StorageService, object_key, random_suffix, sanitize_filename};

use async_trait::async_trait;

/// Maximum number of keys the bulk-delete API accepts per call.
///
/// Chunking to this bound is required correctness for the storage service,
/// not an optimization.
pub const DELETE_BATCH_SIZE: usize = 1000;

/// Operations against the key-addressed object store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads one object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<(), StorageError>;

    /// Deletes one object. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Deletes up to [`DELETE_BATCH_SIZE`] objects in one call.
    async fn delete_batch(&self, keys: &[String]) -> Result<(), StorageError>;

    /// Public retrieval URL for a key.
    fn url_for(&self, key: &str) -> String;
}
