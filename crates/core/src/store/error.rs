//! Data store error types.

use thiserror::Error;

/// Errors from the record store backend.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The backend call itself failed.
    #[error("record store error: {0}")]
    Backend(String),

    /// A stored row could not be decoded into the domain model.
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl RecordError {
    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a malformed-record error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Errors from the client data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record store rejected or failed the operation.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The input failed boundary validation.
    #[error("{0}")]
    Invalid(String),
}

impl StoreError {
    /// Create a validation error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
