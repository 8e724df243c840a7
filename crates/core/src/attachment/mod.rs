//! Attachment lifecycle coordinator.
//!
//! Keeps stored objects aligned with the records that reference them.
//! Cleanup here is best-effort: storage failures are reported
//! and logged, never propagated, so record deletion always proceeds.

mod coordinator;

pub use coordinator::{
    AttachmentCoordinator, CleanupReport, TransactionIndex, delete_transaction_attachments,
};
