//! Identity verifier and hosted-auth admin client.
//!
//! Talks to the hosted auth service over REST: token verification for
//! request handling, plus the admin user APIs (list, create, update,
//! delete) used by the user management surface.

mod error;
mod service;
mod types;

pub use error::IdentityError;
pub use service::{ADMIN_PAGE_SIZE, IdentityService, clean_token, collect_paged};
pub use types::{Identity, NewUser, UserRecord, UserUpdate};

use async_trait::async_trait;

/// Verifies bearer tokens into caller identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolves a raw bearer token to the identity it belongs to.
    async fn verify_token(&self, token: &str) -> Result<Identity, IdentityError>;
}
