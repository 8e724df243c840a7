//! Category types.
//!
//! Categories form a two-level tree: roots have no parent, children
//! reference a root. Parents never themselves have a parent.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A transaction category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Parent category; `None` for roots.
    pub parent_id: Option<Uuid>,
    /// Emoji glyph.
    pub icon: String,
}

impl Category {
    /// Whether this is a root category.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Returns the root categories from a flat list.
#[must_use]
pub fn root_categories(categories: &[Category]) -> Vec<&Category> {
    categories.iter().filter(|c| c.is_root()).collect()
}

/// Returns the children of a root category from a flat list.
#[must_use]
pub fn subcategories(categories: &[Category], parent_id: Uuid) -> Vec<&Category> {
    categories
        .iter()
        .filter(|c| c.parent_id == Some(parent_id))
        .collect()
}
