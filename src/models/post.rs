//! Post model
//!
//! A post is loaded together with its author's username and the parts of
//! its category and location needed to render and filter it. Visibility is
//! decided by [`Post::is_publicly_visible`] and [`Post::is_visible_to`], the
//! in-memory counterparts of the SQL built by `db::query::PostQuery`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blog post with its joined relations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Publication time. A future value schedules the post.
    pub pub_date: DateTime<Utc>,
    /// Image path relative to the media root
    pub image: Option<String>,
    pub is_published: bool,
    pub author_id: i64,
    pub author_username: String,
    pub category: Option<PostCategory>,
    pub location: Option<PostLocation>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Number of comments, present when the query asked for it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<i64>,
}

/// Category fields carried by a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostCategory {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

/// Location fields carried by a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostLocation {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

impl Post {
    /// True when the post itself is published, it has a published category,
    /// and its publication time has been reached.
    pub fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_published
            && self.category.as_ref().is_some_and(|c| c.is_published)
            && self.pub_date <= now
    }

    /// Public visibility, or the viewer wrote the post
    pub fn is_visible_to(&self, viewer: Option<i64>, now: DateTime<Utc>) -> bool {
        self.is_publicly_visible(now) || viewer == Some(self.author_id)
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category.as_ref().map(|c| c.id)
    }

    pub fn location_id(&self) -> Option<i64> {
        self.location.as_ref().map(|l| l.id)
    }
}

/// Input for creating a post. The author is supplied separately and is
/// always the requesting user.
#[derive(Debug, Clone)]
pub struct CreatePostInput {
    pub title: String,
    pub text: String,
    /// Defaults to the creation time
    pub pub_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub is_published: bool,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// Input for editing a post. `None` for `pub_date`, `image` or
/// `is_published` keeps the stored value; every other field is replaced.
#[derive(Debug, Clone)]
pub struct UpdatePostInput {
    pub title: String,
    pub text: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub is_published: Option<bool>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
}
