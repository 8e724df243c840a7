//! Domain model: ledgers, categories, transactions and their embedded
//! attachments.

mod attachment;
mod category;
mod ledger;
mod transaction;

pub use attachment::Attachment;
pub use category::{Category, root_categories, subcategories};
pub use ledger::{Ledger, LedgerPatch, NewLedger};
pub use transaction::{
    NewTransaction, SUPPORTED_CURRENCIES, Transaction, TransactionKind, is_supported_currency,
};
