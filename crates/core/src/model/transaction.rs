//! Transaction types and boundary validation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Attachment;

/// Currency codes accepted for transactions.
pub const SUPPORTED_CURRENCIES: [&str; 10] = [
    "CNY", "USD", "EUR", "GBP", "JPY", "HKD", "AUD", "MYR", "THB", "SGD",
];

/// Whether a currency code is on the supported list.
#[must_use]
pub fn is_supported_currency(code: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&code)
}

/// Expense or income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money going out.
    Expense,
    /// Money coming in.
    Income,
}

impl TransactionKind {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }

    /// Parses the wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expense" => Some(Self::Expense),
            "income" => Some(Self::Income),
            _ => None,
        }
    }
}

/// A financial transaction.
///
/// `ledger_id` is nullable: NULL means the transaction is unscoped and only
/// shows in the all-ledgers view. The embedded `attachments` list is the
/// only record of which storage objects belong to this transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID, assigned at insert.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Ledger scope; `None` for unscoped.
    pub ledger_id: Option<Uuid>,
    /// Category reference.
    pub category_id: Uuid,
    /// Non-negative magnitude, currency-agnostic.
    pub amount: Decimal,
    /// Currency code from [`SUPPORTED_CURRENCIES`].
    pub currency: String,
    /// Expense or income.
    pub kind: TransactionKind,
    /// Free-text description.
    pub description: String,
    /// Embedded attachment documents.
    pub attachments: Vec<Attachment>,
    /// Date of the economic event, distinct from `created_at`.
    pub transaction_date: NaiveDate,
    /// Creation timestamp, assigned at insert.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a transaction; id, timestamps and the final
/// attachment list are filled in later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Ledger scope; `None` for unscoped.
    pub ledger_id: Option<Uuid>,
    /// Category reference.
    pub category_id: Uuid,
    /// Non-negative magnitude.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Expense or income.
    pub kind: TransactionKind,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Date of the economic event.
    pub transaction_date: NaiveDate,
}

impl NewTransaction {
    /// Validates the input before it is sent anywhere.
    ///
    /// # Errors
    ///
    /// Returns a message when the amount is negative or the currency code
    /// is not on the supported list.
    pub fn validate(&self) -> Result<(), String> {
        if self.amount < Decimal::ZERO {
            return Err(format!("amount must be non-negative, got {}", self.amount));
        }
        if !is_supported_currency(&self.currency) {
            return Err(format!("unsupported currency code '{}'", self.currency));
        }
        Ok(())
    }
}
