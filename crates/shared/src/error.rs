//! Application-wide error types.

use thiserror::Error;

/// Application error types.
///
/// Primary-resource failures (record and account operations) abort and
/// report; secondary cleanup failures never reach this type, they are
/// logged at the call site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request is missing or carries an invalid field.
    #[error("{0}")]
    Validation(String),

    /// Missing or unresolvable credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid identity, but not allow-listed.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Record store error; the upstream message is passed through.
    #[error("{0}")]
    Database(String),

    /// Auth or storage service error; the upstream message is passed through.
    #[error("{0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),

    /// A required subsystem is not configured or not reachable.
    #[error("{0}")]
    Unavailable(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_) => 500,
            Self::Unavailable(_) => 503,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}
