//! Record repository backing the client data store.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{categories, ledgers, transactions};
use karma_core::attachment::TransactionIndex;
use karma_core::model::{
    Attachment, Category, Ledger, LedgerPatch, NewLedger, NewTransaction, Transaction,
    TransactionKind,
};
use karma_core::store::{RecordError, RecordStore};

/// `SeaORM`-backed implementation of the record store.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    db: DatabaseConnection,
}

impl RecordRepository {
    /// Create a new record repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for RecordRepository {
    async fn list_ledgers(&self, user_id: Uuid) -> Result<Vec<Ledger>, RecordError> {
        let models = ledgers::Entity::find()
            .filter(ledgers::Column::UserId.eq(user_id))
            .order_by_desc(ledgers::Column::IsDefault)
            .order_by_asc(ledgers::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;

        Ok(models.into_iter().map(ledger_to_domain).collect())
    }

    async fn insert_ledger(
        &self,
        user_id: Uuid,
        new_ledger: NewLedger,
    ) -> Result<Ledger, RecordError> {
        let active_model = ledgers::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(new_ledger.name),
            icon: Set(new_ledger.icon),
            color: Set(new_ledger.color),
            is_default: Set(new_ledger.is_default),
            is_archived: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;

        Ok(ledger_to_domain(model))
    }

    async fn update_ledger(
        &self,
        user_id: Uuid,
        ledger_id: Uuid,
        patch: LedgerPatch,
    ) -> Result<Ledger, RecordError> {
        let model = ledgers::Entity::find_by_id(ledger_id)
            .filter(ledgers::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?
            .ok_or_else(|| RecordError::backend(format!("ledger {ledger_id} not found")))?;

        let mut active_model: ledgers::ActiveModel = model.into();
        if let Some(name) = patch.name {
            active_model.name = Set(name);
        }
        if let Some(icon) = patch.icon {
            active_model.icon = Set(icon);
        }
        if let Some(color) = patch.color {
            active_model.color = Set(color);
        }
        if let Some(is_default) = patch.is_default {
            active_model.is_default = Set(is_default);
        }
        if let Some(is_archived) = patch.is_archived {
            active_model.is_archived = Set(is_archived);
        }

        let model = active_model
            .update(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;

        Ok(ledger_to_domain(model))
    }

    async fn delete_ledger(&self, user_id: Uuid, ledger_id: Uuid) -> Result<(), RecordError> {
        // The FK on transactions is ON DELETE SET NULL; the rows stay.
        ledgers::Entity::delete_many()
            .filter(ledgers::Column::Id.eq(ledger_id))
            .filter(ledgers::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;
        Ok(())
    }

    async fn list_categories(&self, user_id: Uuid) -> Result<Vec<Category>, RecordError> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;

        Ok(models.into_iter().map(category_to_domain).collect())
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, RecordError> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;

        models.into_iter().map(transaction_to_domain).collect()
    }

    async fn insert_transaction(
        &self,
        user_id: Uuid,
        new_transaction: NewTransaction,
        attachments: Vec<Attachment>,
    ) -> Result<Transaction, RecordError> {
        let attachments_json = serde_json::to_value(&attachments)
            .map_err(|e| RecordError::malformed(e.to_string()))?;

        let active_model = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            ledger_id: Set(new_transaction.ledger_id),
            category_id: Set(new_transaction.category_id),
            amount: Set(new_transaction.amount),
            currency: Set(new_transaction.currency),
            kind: Set(new_transaction.kind.as_str().to_string()),
            description: Set(new_transaction.description),
            attachments: Set(attachments_json),
            transaction_date: Set(new_transaction.transaction_date),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;

        transaction_to_domain(model)
    }

    async fn delete_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), RecordError> {
        transactions::Entity::delete_many()
            .filter(transactions::Column::Id.eq(transaction_id))
            .filter(transactions::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TransactionIndex for RecordRepository {
    async fn attachment_keys_for_user(&self, user_id: Uuid) -> Result<Vec<String>, RecordError> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;

        let mut keys = Vec::new();
        for model in models {
            match serde_json::from_value::<Vec<Attachment>>(model.attachments) {
                Ok(attachments) => keys.extend(attachments.into_iter().map(|a| a.key)),
                Err(e) => {
                    warn!(transaction_id = %model.id, error = %e, "skipping malformed attachment document");
                }
            }
        }
        Ok(keys)
    }
}

fn ledger_to_domain(model: ledgers::Model) -> Ledger {
    Ledger {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        icon: model.icon,
        color: model.color,
        is_default: model.is_default,
        is_archived: model.is_archived,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn category_to_domain(model: categories::Model) -> Category {
    Category {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        parent_id: model.parent_id,
        icon: model.icon,
    }
}

fn transaction_to_domain(model: transactions::Model) -> Result<Transaction, RecordError> {
    let kind = TransactionKind::parse(&model.kind).ok_or_else(|| {
        RecordError::malformed(format!(
            "transaction {} has unknown type '{}'",
            model.id, model.kind
        ))
    })?;
    let attachments: Vec<Attachment> =
        serde_json::from_value(model.attachments).map_err(|e| {
            RecordError::malformed(format!(
                "transaction {} has a bad attachment document: {e}",
                model.id
            ))
        })?;

    Ok(Transaction {
        id: model.id,
        user_id: model.user_id,
        ledger_id: model.ledger_id,
        category_id: model.category_id,
        amount: model.amount,
        currency: model.currency,
        kind,
        description: model.description,
        attachments,
        transaction_date: model.transaction_date,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
