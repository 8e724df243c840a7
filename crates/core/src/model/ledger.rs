//! Ledger types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ledger (book) grouping transactions.
///
/// `is_default` is advisory: at most one per user should be true, but the
/// invariant is not enforced here. Deleting a ledger detaches its
/// transactions (their `ledger_id` becomes NULL), it never cascades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Ledger ID, assigned at insert.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Emoji glyph shown in the UI.
    pub icon: String,
    /// Color tag.
    pub color: String,
    /// Whether this is the user's default ledger.
    pub is_default: bool,
    /// Whether the ledger is archived.
    pub is_archived: bool,
    /// Creation timestamp, assigned at insert.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLedger {
    /// Display name.
    pub name: String,
    /// Emoji glyph.
    pub icon: String,
    /// Color tag.
    pub color: String,
    /// Whether this should become the default ledger.
    #[serde(default)]
    pub is_default: bool,
}

/// Partial update for a ledger; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerPatch {
    /// New display name.
    pub name: Option<String>,
    /// New emoji glyph.
    pub icon: Option<String>,
    /// New color tag.
    pub color: Option<String>,
    /// New default flag.
    pub is_default: Option<bool>,
    /// New archived flag.
    pub is_archived: Option<bool>,
}

impl LedgerPatch {
    /// Applies the patch to a ledger in place.
    pub fn apply(&self, ledger: &mut Ledger) {
        if let Some(name) = &self.name {
            ledger.name = name.clone();
        }
        if let Some(icon) = &self.icon {
            ledger.icon = icon.clone();
        }
        if let Some(color) = &self.color {
            ledger.color = color.clone();
        }
        if let Some(is_default) = self.is_default {
            ledger.is_default = is_default;
        }
        if let Some(is_archived) = self.is_archived {
            ledger.is_archived = is_archived;
        }
    }
}
