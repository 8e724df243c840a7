//! User data purge for the admin API.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use crate::entities::{authorized_users, categories, ledgers, profiles, transactions, user_settings};
use karma_core::store::RecordError;

/// Row counts removed by a purge, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Authorization rows removed.
    pub authorized_users: u64,
    /// Transaction rows removed.
    pub transactions: u64,
    /// Category rows removed.
    pub categories: u64,
    /// Ledger rows removed.
    pub ledgers: u64,
    /// Settings rows removed.
    pub user_settings: u64,
    /// Profile rows removed.
    pub profiles: u64,
}

impl PurgeSummary {
    /// Total rows removed across all tables.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.authorized_users
            + self.transactions
            + self.categories
            + self.ledgers
            + self.user_settings
            + self.profiles
    }
}

/// Repository for whole-account data operations.
#[derive(Debug, Clone)]
pub struct UserDataRepository {
    db: DatabaseConnection,
}

impl UserDataRepository {
    /// Create a new user data repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Add an account to the authorization list. Authorizing an account
    /// that already has a row is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when the database call fails.
    pub async fn authorize(&self, user_id: Uuid, email: &str) -> Result<(), RecordError> {
        let existing = authorized_users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?;
        if existing.is_some() {
            return Ok(());
        }

        authorized_users::ActiveModel {
            user_id: Set(user_id),
            email: Set(email.trim().to_lowercase()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RecordError::backend(e.to_string()))?;
        Ok(())
    }

    /// Delete every record belonging to a user.
    ///
    /// Tables are cleared in dependency order: the authorization row
    /// first (so the account cannot sign back in mid-purge), then
    /// transactions before the ledgers and categories they reference,
    /// then settings and profile. Stored attachment objects are not
    /// handled here; the attachment coordinator purges those.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failed delete; earlier deletes are
    /// not rolled back.
    pub async fn purge_records(&self, user_id: Uuid) -> Result<PurgeSummary, RecordError> {
        let mut summary = PurgeSummary::default();

        summary.authorized_users = authorized_users::Entity::delete_many()
            .filter(authorized_users::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?
            .rows_affected;

        summary.transactions = transactions::Entity::delete_many()
            .filter(transactions::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?
            .rows_affected;

        summary.categories = categories::Entity::delete_many()
            .filter(categories::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?
            .rows_affected;

        summary.ledgers = ledgers::Entity::delete_many()
            .filter(ledgers::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?
            .rows_affected;

        summary.user_settings = user_settings::Entity::delete_many()
            .filter(user_settings::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?
            .rows_affected;

        summary.profiles = profiles::Entity::delete_many()
            .filter(profiles::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| RecordError::backend(e.to_string()))?
            .rows_affected;

        info!(%user_id, rows = summary.total(), "user records purged");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn summary_totals_every_table() {
        let summary = PurgeSummary {
            authorized_users: 1,
            transactions: 1500,
            categories: 13,
            ledgers: 2,
            user_settings: 1,
            profiles: 1,
        };
        assert_eq!(summary.total(), 1518);
    }

    fn exec_ok(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn purge_always_removes_the_authorization_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                exec_ok(1), // authorized_users
                exec_ok(4), // transactions
                exec_ok(3), // categories
                exec_ok(2), // ledgers
                exec_ok(1), // user_settings
                exec_ok(1), // profiles
            ])
            .into_connection();

        let user_id = Uuid::new_v4();
        let summary = UserDataRepository::new(db.clone())
            .purge_records(user_id)
            .await
            .unwrap();

        assert_eq!(summary.authorized_users, 1);
        assert_eq!(summary.total(), 12);

        // The authorization row goes first, scoped by user id.
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 6);
        let first = format!("{:?}", log[0]);
        assert!(first.contains("authorized_users"));
        assert!(first.contains(&user_id.to_string()));
    }

    #[tokio::test]
    async fn authorize_is_a_no_op_for_known_accounts() {
        let user_id = Uuid::new_v4();
        let existing = authorized_users::Model {
            user_id,
            email: "admin@example.com".to_string(),
            created_at: Utc::now().into(),
        };
        // Only a lookup result is queued; an insert attempt would fail.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .into_connection();

        UserDataRepository::new(db)
            .authorize(user_id, "admin@example.com")
            .await
            .unwrap();
    }
}
