//! Best-effort cleanup of stored attachment objects.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::Transaction;
use crate::storage::{DELETE_BATCH_SIZE, ObjectStore};
use crate::store::RecordError;

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Number of objects cleanup was attempted for.
    pub attempted: usize,
    /// Number of objects whose deletion failed.
    pub failed: usize,
}

impl CleanupReport {
    /// Whether every attempted deletion succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Lookup of every attachment key referenced by a user's records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionIndex: Send + Sync {
    /// All attachment keys embedded in the user's transactions.
    async fn attachment_keys_for_user(&self, user_id: Uuid) -> Result<Vec<String>, RecordError>;
}

/// Delete every object a transaction references.
///
/// Deletions run concurrently and all of them are driven to completion;
/// failures are logged per key and counted, never returned as errors.
pub async fn delete_transaction_attachments<S>(storage: &S, transaction: &Transaction) -> CleanupReport
where
    S: ObjectStore + ?Sized,
{
    let keys: Vec<&str> = transaction
        .attachments
        .iter()
        .map(|a| a.key.as_str())
        .collect();
    if keys.is_empty() {
        return CleanupReport::default();
    }

    let results = join_all(keys.iter().map(|key| storage.delete(key))).await;

    let mut report = CleanupReport {
        attempted: keys.len(),
        failed: 0,
    };
    for (key, result) in keys.iter().zip(results) {
        if let Err(e) = result {
            warn!(key, error = %e, "attachment deletion failed");
            report.failed += 1;
        }
    }
    report
}

/// Couples the object store with the record index for lifecycle work
/// that spans both.
pub struct AttachmentCoordinator<S, R>
where
    S: ObjectStore + ?Sized,
    R: TransactionIndex + ?Sized,
{
    storage: Arc<S>,
    index: Arc<R>,
}

impl<S, R> AttachmentCoordinator<S, R>
where
    S: ObjectStore + ?Sized,
    R: TransactionIndex + ?Sized,
{
    /// Create a coordinator over the given store and index.
    pub fn new(storage: Arc<S>, index: Arc<R>) -> Self {
        Self { storage, index }
    }

    /// Delete every object a transaction references. See
    /// [`delete_transaction_attachments`].
    pub async fn delete_for_transaction(&self, transaction: &Transaction) -> CleanupReport {
        delete_transaction_attachments(self.storage.as_ref(), transaction).await
    }

    /// Delete every stored object belonging to a user.
    ///
    /// Reads the user's full key set from the record index, then issues
    /// bulk deletes in chunks of at most [`DELETE_BATCH_SIZE`] keys,
    /// dispatched concurrently. An index read failure, or any batch
    /// failure, is logged and counted; neither aborts the purge.
    pub async fn purge_user_attachments(&self, user_id: Uuid) -> CleanupReport {
        let keys = match self.index.attachment_keys_for_user(user_id).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(%user_id, error = %e, "could not enumerate attachment keys, skipping purge");
                return CleanupReport::default();
            }
        };
        if keys.is_empty() {
            return CleanupReport::default();
        }

        let chunks: Vec<&[String]> = keys.chunks(DELETE_BATCH_SIZE).collect();
        let results = join_all(chunks.iter().map(|chunk| self.storage.delete_batch(chunk))).await;

        let mut report = CleanupReport {
            attempted: keys.len(),
            failed: 0,
        };
        for (chunk, result) in chunks.iter().zip(results) {
            if let Err(e) = result {
                warn!(%user_id, batch_size = chunk.len(), error = %e, "attachment batch deletion failed");
                report.failed += chunk.len();
            }
        }

        info!(
            %user_id,
            attempted = report.attempted,
            failed = report.failed,
            "user attachment purge finished"
        );
        report
    }
}
