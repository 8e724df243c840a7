//! Per-user data store with write-through caches.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::attachment::{CleanupReport, delete_transaction_attachments};
use crate::model::{
    Attachment, Category, Ledger, LedgerPatch, NewLedger, NewTransaction, Transaction,
    TransactionKind,
};
use crate::storage::{ObjectStore, object_key, random_suffix, sanitize_filename};

use super::demo;
use super::error::StoreError;
use super::RecordStore;

/// A file selected for upload alongside a new transaction.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Where a [`DataStore`] sends its writes.
pub enum Backend<R, S>
where
    R: RecordStore + ?Sized,
    S: ObjectStore + ?Sized,
{
    /// Backed by the record store and object storage.
    Remote {
        /// Persistent record store.
        records: Arc<R>,
        /// Object storage for attachments.
        objects: Arc<S>,
        /// Key prefix for uploaded objects.
        folder: String,
    },
    /// Generated dataset only; no backend is ever contacted.
    Demo,
}

/// The per-user data store.
///
/// Holds local caches of ledgers, categories and transactions. Every
/// mutation goes to the backend first and the caches are reconciled
/// explicitly from the outcome; nothing here refetches behind the
/// caller's back.
pub struct DataStore<R, S>
where
    R: RecordStore + ?Sized,
    S: ObjectStore + ?Sized,
{
    user_id: Uuid,
    backend: Backend<R, S>,
    ledgers: Vec<Ledger>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
}

impl<R, S> DataStore<R, S>
where
    R: RecordStore + ?Sized,
    S: ObjectStore + ?Sized,
{
    /// Create a store backed by the record store and object storage.
    /// Caches start empty; call [`Self::fetch_initial`] to fill them.
    pub fn remote(
        user_id: Uuid,
        records: Arc<R>,
        objects: Arc<S>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            backend: Backend::Remote {
                records,
                objects,
                folder: folder.into(),
            },
            ledgers: Vec::new(),
            categories: Vec::new(),
            transactions: Vec::new(),
        }
    }

    /// Create a demo store seeded with the generated dataset.
    #[must_use]
    pub fn demo(user_id: Uuid) -> Self {
        Self::demo_with_rng(user_id, &mut rand::rng())
    }

    /// Demo store with a caller-supplied RNG, for reproducible datasets.
    pub fn demo_with_rng<G: rand::Rng>(user_id: Uuid, rng: &mut G) -> Self {
        let ledgers = demo::mock_ledgers(user_id);
        let categories = demo::mock_categories(user_id);
        let transactions = demo::generate_mock_transactions(user_id, &ledgers, &categories, rng);
        Self {
            user_id,
            backend: Backend::Demo,
            ledgers,
            categories,
            transactions,
        }
    }

    /// The user this store is scoped to.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Whether the store runs on the generated dataset.
    #[must_use]
    pub fn is_demo(&self) -> bool {
        matches!(self.backend, Backend::Demo)
    }

    /// Cached ledgers.
    #[must_use]
    pub fn ledgers(&self) -> &[Ledger] {
        &self.ledgers
    }

    /// Cached categories.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Cached transactions, newest first.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Load the caches from the record store. A no-op in demo mode.
    ///
    /// # Errors
    ///
    /// Returns an error when any of the listings fails; the caches keep
    /// whatever they held before.
    pub async fn fetch_initial(&mut self) -> Result<(), StoreError> {
        let Backend::Remote { records, .. } = &self.backend else {
            return Ok(());
        };

        let ledgers = records.list_ledgers(self.user_id).await?;
        let categories = records.list_categories(self.user_id).await?;
        let mut transactions = records.list_transactions(self.user_id).await?;
        sort_newest_first(&mut transactions);

        self.ledgers = ledgers;
        self.categories = categories;
        self.transactions = transactions;
        Ok(())
    }

    /// Create a ledger and add it to the cache.
    ///
    /// # Errors
    ///
    /// Returns an error when the record store rejects the insert.
    pub async fn add_ledger(&mut self, new_ledger: NewLedger) -> Result<Ledger, StoreError> {
        let ledger = match &self.backend {
            Backend::Remote { records, .. } => {
                records.insert_ledger(self.user_id, new_ledger).await?
            }
            Backend::Demo => Ledger {
                id: Uuid::new_v4(),
                user_id: self.user_id,
                name: new_ledger.name,
                icon: new_ledger.icon,
                color: new_ledger.color,
                is_default: new_ledger.is_default,
                is_archived: false,
                created_at: Utc::now(),
            },
        };
        self.ledgers.push(ledger.clone());
        Ok(ledger)
    }

    /// Apply a partial update to a ledger and reconcile the cache.
    ///
    /// # Errors
    ///
    /// Returns an error when the ledger is not in the cache or the record
    /// store rejects the update.
    pub async fn update_ledger(
        &mut self,
        ledger_id: Uuid,
        patch: LedgerPatch,
    ) -> Result<Ledger, StoreError> {
        let Some(pos) = self.ledgers.iter().position(|l| l.id == ledger_id) else {
            return Err(StoreError::invalid(format!("unknown ledger {ledger_id}")));
        };

        match &self.backend {
            Backend::Remote { records, .. } => {
                let updated = records.update_ledger(self.user_id, ledger_id, patch).await?;
                self.ledgers[pos] = updated;
            }
            Backend::Demo => {
                patch.apply(&mut self.ledgers[pos]);
            }
        }
        Ok(self.ledgers[pos].clone())
    }

    /// Delete a ledger.
    ///
    /// The record store detaches the ledger's transactions rather than
    /// deleting them; the cache mirrors that by nulling `ledger_id` on
    /// every cached transaction that referenced it.
    ///
    /// # Errors
    ///
    /// Returns an error when the record store rejects the delete; the
    /// cache is left untouched in that case.
    pub async fn delete_ledger(&mut self, ledger_id: Uuid) -> Result<(), StoreError> {
        if let Backend::Remote { records, .. } = &self.backend {
            records.delete_ledger(self.user_id, ledger_id).await?;
        }

        self.ledgers.retain(|l| l.id != ledger_id);
        for transaction in &mut self.transactions {
            if transaction.ledger_id == Some(ledger_id) {
                transaction.ledger_id = None;
            }
        }
        Ok(())
    }

    /// Create a transaction, uploading its attachments first.
    ///
    /// Uploads run concurrently. A failed upload is logged and dropped
    /// from the attachment list; it never fails the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error when validation fails or the record store rejects
    /// the insert. Objects already uploaded are not rolled back.
    pub async fn add_transaction(
        &mut self,
        new_transaction: NewTransaction,
        uploads: Vec<AttachmentUpload>,
    ) -> Result<Transaction, StoreError> {
        new_transaction.validate().map_err(StoreError::Invalid)?;

        let transaction = match &self.backend {
            Backend::Remote {
                records,
                objects,
                folder,
            } => {
                let attachments: Vec<Attachment> = join_all(
                    uploads
                        .into_iter()
                        .map(|upload| upload_attachment(objects.as_ref(), folder, upload)),
                )
                .await
                .into_iter()
                .flatten()
                .collect();

                records
                    .insert_transaction(self.user_id, new_transaction, attachments)
                    .await?
            }
            Backend::Demo => Transaction {
                id: Uuid::new_v4(),
                user_id: self.user_id,
                ledger_id: new_transaction.ledger_id,
                category_id: new_transaction.category_id,
                amount: new_transaction.amount,
                currency: new_transaction.currency,
                kind: new_transaction.kind,
                description: new_transaction.description,
                attachments: uploads.into_iter().map(demo_attachment).collect(),
                transaction_date: new_transaction.transaction_date,
                created_at: Utc::now(),
            },
        };

        self.transactions.push(transaction.clone());
        sort_newest_first(&mut self.transactions);
        Ok(transaction)
    }

    /// Delete a transaction and its stored attachments.
    ///
    /// Attachment cleanup runs first and is best-effort; the record
    /// delete proceeds regardless of storage failures, and the cache
    /// entry is removed once the record delete succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the transaction is not in the cache or the
    /// record store rejects the delete.
    pub async fn delete_transaction(
        &mut self,
        transaction_id: Uuid,
    ) -> Result<CleanupReport, StoreError> {
        let Some(pos) = self
            .transactions
            .iter()
            .position(|t| t.id == transaction_id)
        else {
            return Err(StoreError::invalid(format!(
                "unknown transaction {transaction_id}"
            )));
        };

        let report = match &self.backend {
            Backend::Remote {
                records, objects, ..
            } => {
                let report =
                    delete_transaction_attachments(objects.as_ref(), &self.transactions[pos])
                        .await;
                records
                    .delete_transaction(self.user_id, transaction_id)
                    .await?;
                report
            }
            Backend::Demo => CleanupReport::default(),
        };

        self.transactions.remove(pos);
        Ok(report)
    }

    /// Number of cached transactions.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Sum of cached amounts for one kind.
    #[must_use]
    pub fn total(&self, kind: TransactionKind) -> Decimal {
        self.transactions
            .iter()
            .filter(|t| t.kind == kind)
            .fold(Decimal::ZERO, |acc, t| acc + t.amount)
    }

    /// Income minus expense within one ledger.
    #[must_use]
    pub fn ledger_balance(&self, ledger_id: Uuid) -> Decimal {
        self.transactions
            .iter()
            .filter(|t| t.ledger_id == Some(ledger_id))
            .fold(Decimal::ZERO, |acc, t| match t.kind {
                TransactionKind::Income => acc + t.amount,
                TransactionKind::Expense => acc - t.amount,
            })
    }

    /// Expense totals grouped by root category, largest first.
    ///
    /// Expenses against a subcategory count toward its root.
    #[must_use]
    pub fn expense_by_root_category(&self) -> Vec<(Uuid, Decimal)> {
        let root_of: HashMap<Uuid, Uuid> = self
            .categories
            .iter()
            .map(|c| (c.id, c.parent_id.unwrap_or(c.id)))
            .collect();

        let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
        for transaction in &self.transactions {
            if transaction.kind != TransactionKind::Expense {
                continue;
            }
            let Some(&root) = root_of.get(&transaction.category_id) else {
                continue;
            };
            *totals.entry(root).or_insert(Decimal::ZERO) += transaction.amount;
        }

        let mut out: Vec<(Uuid, Decimal)> = totals.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }
}

/// Upload one file, returning `None` on failure so the caller can drop
/// it from the attachment list.
async fn upload_attachment<S>(
    objects: &S,
    folder: &str,
    upload: AttachmentUpload,
) -> Option<Attachment>
where
    S: ObjectStore + ?Sized,
{
    let key = object_key(folder, &upload.filename, Utc::now(), &random_suffix());
    match objects
        .put(&key, upload.bytes, &upload.content_type)
        .await
    {
        Ok(()) => Some(Attachment {
            url: objects.url_for(&key),
            key,
            name: upload.filename,
            content_type: upload.content_type,
        }),
        Err(e) => {
            warn!(key, filename = upload.filename, error = %e, "attachment upload failed, dropping");
            None
        }
    }
}

/// Demo-mode attachments live only in the cache.
fn demo_attachment(upload: AttachmentUpload) -> Attachment {
    let key = format!(
        "demo/{}-{}",
        random_suffix(),
        sanitize_filename(&upload.filename)
    );
    Attachment {
        url: format!("memory://{key}"),
        key,
        name: upload.filename,
        content_type: upload.content_type,
    }
}

fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        b.transaction_date
            .cmp(&a.transaction_date)
            .then(b.created_at.cmp(&a.created_at))
    });
}
