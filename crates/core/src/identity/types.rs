//! Identity and admin user types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID assigned by the auth service.
    pub id: Uuid,
    /// Email, when the account has one.
    pub email: Option<String>,
}

impl Identity {
    /// Lowercased email for allowlist comparison.
    #[must_use]
    pub fn email_lowercase(&self) -> Option<String> {
        self.email.as_ref().map(|e| e.trim().to_lowercase())
    }
}

/// An account as reported by the admin user listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// User ID.
    pub id: Uuid,
    /// Email, when the account has one.
    pub email: Option<String>,
    /// Account creation timestamp, as reported upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last sign-in timestamp, as reported upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sign_in_at: Option<String>,
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Initial password.
    pub password: String,
}

/// Partial update for an account. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New email, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New password, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    /// Whether the update carries any change at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_lowercase_trims_and_folds() {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some("  Admin@Example.COM ".to_string()),
        };
        assert_eq!(
            identity.email_lowercase().as_deref(),
            Some("admin@example.com")
        );
    }

    #[test]
    fn user_update_skips_absent_fields() {
        let update = UserUpdate {
            email: Some("new@example.com".to_string()),
            password: None,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"email": "new@example.com"}));
        assert!(!update.is_empty());
        assert!(UserUpdate::default().is_empty());
    }
}
