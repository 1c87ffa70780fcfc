//! Location model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named place a post can be attached to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn new(name: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            is_published: true,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a new location
#[derive(Debug, Clone)]
pub struct CreateLocationInput {
    pub name: String,
    pub is_published: bool,
}

/// Input for updating a location
#[derive(Debug, Clone, Default)]
pub struct UpdateLocationInput {
    pub name: Option<String>,
    pub is_published: Option<bool>,
}
