//! Shared API response types
//!
//! Every page is returned as a JSON context object, named after the
//! template variables a front end would render.

use serde::Serialize;

use crate::models::{Category, Comment, CommentForm, Location, PagedResult, Post, User};

// ============================================================================
// Listings
// ============================================================================

/// Index page
#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub page_obj: PagedResult<Post>,
}

/// A user's profile with their posts
#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub profile: User,
    pub page_obj: PagedResult<Post>,
}

/// A category with its posts
#[derive(Debug, Serialize)]
pub struct CategoryContext {
    pub category: Category,
    pub page_obj: PagedResult<Post>,
}

// ============================================================================
// Posts
// ============================================================================

/// Post page with its comments and an empty comment form
#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub post: Post,
    pub form: CommentForm,
    pub comments: Vec<Comment>,
}

/// Create/edit post form. `post` holds the current values when editing.
#[derive(Debug, Serialize)]
pub struct PostFormContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

/// Delete confirmation
#[derive(Debug, Serialize)]
pub struct PostContext {
    pub post: Post,
}

// ============================================================================
// Comments, profiles, auth
// ============================================================================

/// Comment edit form or delete confirmation
#[derive(Debug, Serialize)]
pub struct CommentContext {
    pub comment: Comment,
    pub form: CommentForm,
}

/// Profile edit form prefilled with the current values
#[derive(Debug, Serialize)]
pub struct ProfileFormContext {
    pub form: User,
}

/// Login page
#[derive(Debug, Serialize)]
pub struct LoginContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}
