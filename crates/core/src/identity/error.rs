//! Identity error types.

use thiserror::Error;

/// Errors from the identity verifier and admin user APIs.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is missing, malformed, expired, or rejected upstream.
    #[error("invalid or expired token")]
    Unauthenticated,

    /// The auth service call itself failed.
    #[error("auth service error: {0}")]
    Service(String),
}

impl IdentityError {
    /// Create a service error.
    #[must_use]
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        Self::Service(err.to_string())
    }
}
