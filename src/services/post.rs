//! Post service
//!
//! Listings, single-post reads and post mutations. Every read is expressed
//! as a [`PostQuery`], so visibility is decided in one place:
//!
//! - the index and category pages show published posts only;
//! - a profile page and a post detail page additionally show the viewer's
//!   own drafts and scheduled posts.

use crate::db::query::PostQuery;
use crate::db::repositories::{CategoryRepository, LocationRepository, PostRepository};
use crate::models::{
    CreatePostInput, ListParams, PageSelector, PagedResult, Post, UpdatePostInput, POSTS_PER_PAGE,
};
use crate::services::validation::{check_required, FieldErrors, MAX_TITLE_LENGTH};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Missing, or not visible to the viewer
    #[error("Post not found: {0}")]
    NotFound(i64),

    /// The requested page is outside the listing
    #[error("Invalid page")]
    PageNotFound,

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    locations: Arc<dyn LocationRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        locations: Arc<dyn LocationRepository>,
    ) -> Self {
        Self {
            posts,
            categories,
            locations,
        }
    }

    /// Index page: published posts with comment counts
    pub async fn list_published(
        &self,
        page: PageSelector,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let query = PostQuery::published(Utc::now()).with_comment_count();
        self.paginate(query, page).await
    }

    /// Posts of `author_id` that `viewer` may see. The author sees all of
    /// their own posts.
    pub async fn list_for_profile(
        &self,
        author_id: i64,
        viewer: Option<i64>,
        page: PageSelector,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let query = PostQuery::visible_to(viewer, Utc::now())
            .by_author(author_id)
            .with_comment_count();
        self.paginate(query, page).await
    }

    /// Published posts of one category
    pub async fn list_by_category(
        &self,
        category_id: i64,
        page: PageSelector,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let query = PostQuery::published(Utc::now())
            .in_category(category_id)
            .with_comment_count();
        self.paginate(query, page).await
    }

    /// A post the viewer may read, with its comment count
    pub async fn get_visible(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<Post, PostServiceError> {
        let query = PostQuery::visible_to(viewer, Utc::now())
            .with_id(id)
            .with_comment_count();
        self.posts
            .fetch_one(&query)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound(id))
    }

    /// A post regardless of visibility
    pub async fn get(&self, id: i64) -> Result<Post, PostServiceError> {
        self.posts
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound(id))
    }

    /// Create a post written by `author_id`
    pub async fn create(
        &self,
        author_id: i64,
        input: CreatePostInput,
    ) -> Result<Post, PostServiceError> {
        self.validate(&input.title, &input.text, input.category_id, input.location_id)
            .await?;

        let post = self
            .posts
            .create(author_id, &input)
            .await
            .context("Failed to create post")?;

        tracing::info!(post_id = post.id, author_id, "Post created");
        Ok(post)
    }

    pub async fn update(&self, id: i64, input: UpdatePostInput) -> Result<Post, PostServiceError> {
        self.get(id).await?;
        self.validate(&input.title, &input.text, input.category_id, input.location_id)
            .await?;

        let post = self
            .posts
            .update(id, &input)
            .await
            .context("Failed to update post")?;
        Ok(post)
    }

    /// Delete a post with its comments, returning what was deleted
    pub async fn delete(&self, id: i64) -> Result<Post, PostServiceError> {
        let post = self.get(id).await?;
        self.posts
            .delete(id)
            .await
            .context("Failed to delete post")?;
        tracing::info!(post_id = id, "Post deleted");
        Ok(post)
    }

    async fn paginate(
        &self,
        query: PostQuery,
        page: PageSelector,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let total = self
            .posts
            .count(&query)
            .await
            .context("Failed to count posts")?;
        let params = ListParams::resolve(page, total, POSTS_PER_PAGE)
            .ok_or(PostServiceError::PageNotFound)?;

        let items = self
            .posts
            .fetch(&query.paginate(params.offset(), params.limit()))
            .await
            .context("Failed to list posts")?;

        Ok(PagedResult::new(items, total, &params))
    }

    async fn validate(
        &self,
        title: &str,
        text: &str,
        category_id: Option<i64>,
        location_id: Option<i64>,
    ) -> Result<(), PostServiceError> {
        let mut errors = FieldErrors::new();
        check_required(&mut errors, "title", title, Some(MAX_TITLE_LENGTH));
        check_required(&mut errors, "text", text, None);

        if let Some(id) = category_id {
            let category = self
                .categories
                .get_by_id(id)
                .await
                .context("Failed to check category")?;
            if category.is_none() {
                errors.add("category", "Select a valid choice.");
            }
        }
        if let Some(id) = location_id {
            let location = self
                .locations
                .get_by_id(id)
                .await
                .context("Failed to check location")?;
            if location.is_none() {
                errors.add("location", "Select a valid choice.");
            }
        }

        errors.into_result().map_err(PostServiceError::ValidationError)
    }
}
