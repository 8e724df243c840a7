//! Client data store.
//!
//! [`DataStore`] is the per-user, in-memory mirror of the record store.
//! Mutations write through to the backend first and reconcile the local
//! caches explicitly on success. In demo mode the store runs entirely on
//! a generated dataset and never touches the record store or object
//! storage.

mod data_store;
mod demo;
mod error;

pub use data_store::{AttachmentUpload, Backend, DataStore};
pub use demo::{
    DEMO_TRANSACTION_COUNT, DEMO_WINDOW_DAYS, generate_mock_transactions, mock_categories,
    mock_ledgers,
};
pub use error::{RecordError, StoreError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{
    Attachment, Category, Ledger, LedgerPatch, NewLedger, NewTransaction, Transaction,
};

/// Persistent record operations, always scoped to one user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All ledgers owned by the user.
    async fn list_ledgers(&self, user_id: Uuid) -> Result<Vec<Ledger>, RecordError>;

    /// Inserts a ledger and returns the stored row.
    async fn insert_ledger(
        &self,
        user_id: Uuid,
        new_ledger: NewLedger,
    ) -> Result<Ledger, RecordError>;

    /// Applies a partial update and returns the stored row.
    async fn update_ledger(
        &self,
        user_id: Uuid,
        ledger_id: Uuid,
        patch: LedgerPatch,
    ) -> Result<Ledger, RecordError>;

    /// Deletes a ledger. Transactions referencing it are unscoped by the
    /// store, not removed.
    async fn delete_ledger(&self, user_id: Uuid, ledger_id: Uuid) -> Result<(), RecordError>;

    /// All categories visible to the user.
    async fn list_categories(&self, user_id: Uuid) -> Result<Vec<Category>, RecordError>;

    /// All transactions owned by the user, newest first.
    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, RecordError>;

    /// Inserts a transaction with its final attachment list and returns
    /// the stored row.
    async fn insert_transaction(
        &self,
        user_id: Uuid,
        new_transaction: NewTransaction,
        attachments: Vec<Attachment>,
    ) -> Result<Transaction, RecordError>;

    /// Deletes a transaction row.
    async fn delete_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), RecordError>;
}
