//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A thematic category. Posts of an unpublished category are hidden from
/// the public listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    pub description: String,
    /// URL identifier: latin letters, digits, hyphen and underscore
    pub slug: String,
    pub is_published: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new published Category. The ID is assigned by the database.
    pub fn new(title: String, description: String, slug: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            title,
            description,
            slug,
            is_published: true,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a new category
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    pub title: String,
    pub description: String,
    /// Generated from the title when absent
    pub slug: Option<String>,
    pub is_published: bool,
}

/// Input for updating a category
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub is_published: Option<bool>,
}
