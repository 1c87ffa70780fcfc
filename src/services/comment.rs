//! Comment service
//!
//! Adding, editing and deleting comments. A comment is only reachable
//! through the post it belongs to: looking one up under the wrong post is
//! `NotFound`.

use crate::db::repositories::CommentRepository;
use crate::models::Comment;
use crate::services::validation::{check_required, FieldErrors};
use anyhow::Context;
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Comment not found (or not under the given post)
    #[error("Comment not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>) -> Self {
        Self { repo }
    }

    /// Add a comment by `author_id` under `post_id`.
    ///
    /// The caller is responsible for checking that the post is visible to
    /// the author.
    pub async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, CommentServiceError> {
        validate_text(text)?;
        let comment = self
            .repo
            .create(post_id, author_id, text.trim())
            .await
            .context("Failed to create comment")?;

        tracing::debug!(comment_id = comment.id, post_id, "Comment added");
        Ok(comment)
    }

    /// A comment belonging to `post_id`
    pub async fn get(&self, post_id: i64, comment_id: i64) -> Result<Comment, CommentServiceError> {
        self.repo
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?
            .filter(|c| c.post_id == post_id)
            .ok_or(CommentServiceError::NotFound(comment_id))
    }

    /// Comments of a post, oldest first
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, CommentServiceError> {
        let comments = self
            .repo
            .list_by_post(post_id)
            .await
            .context("Failed to list comments")?;
        Ok(comments)
    }

    pub async fn update(
        &self,
        post_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<Comment, CommentServiceError> {
        self.get(post_id, comment_id).await?;
        validate_text(text)?;

        let comment = self
            .repo
            .update_text(comment_id, text.trim())
            .await
            .context("Failed to update comment")?;
        Ok(comment)
    }

    pub async fn delete(&self, post_id: i64, comment_id: i64) -> Result<(), CommentServiceError> {
        self.get(post_id, comment_id).await?;
        self.repo
            .delete(comment_id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }
}

fn validate_text(text: &str) -> Result<(), CommentServiceError> {
    let mut errors = FieldErrors::new();
    check_required(&mut errors, "text", text, None);
    errors.into_result().map_err(CommentServiceError::ValidationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        CategoryRepository, PostRepository, SqlxCategoryRepository, SqlxCommentRepository,
        SqlxPostRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Category, CreatePostInput, User};

    async fn setup() -> (CommentService, i64, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new("writer".to_string(), String::new(), "hash".to_string()))
            .await
            .unwrap();
        let category = SqlxCategoryRepository::new(pool.clone())
            .create(&Category::new("Open".to_string(), String::new(), "open".to_string()))
            .await
            .unwrap();
        let posts = SqlxPostRepository::new(pool.clone());
        let mut post_ids = Vec::new();
        for title in ["first", "second"] {
            let post = posts
                .create(
                    user.id,
                    &CreatePostInput {
                        title: title.to_string(),
                        text: "Body".to_string(),
                        pub_date: None,
                        image: None,
                        is_published: true,
                        location_id: None,
                        category_id: Some(category.id),
                    },
                )
                .await
                .unwrap();
            post_ids.push(post.id);
        }

        (
            CommentService::new(SqlxCommentRepository::boxed(pool)),
            user.id,
            post_ids[0],
            post_ids[1],
        )
    }

    #[tokio::test]
    async fn test_blank_comment_rejected() {
        let (service, user, post, _) = setup().await;
        let result = service.create(post, user, "   ").await;
        assert!(matches!(result, Err(CommentServiceError::ValidationError(e)) if e.has("text")));
    }

    #[tokio::test]
    async fn test_comment_must_belong_to_post() {
        let (service, user, post, other_post) = setup().await;
        let comment = service.create(post, user, "Hello").await.unwrap();

        assert!(service.get(post, comment.id).await.is_ok());
        assert!(matches!(
            service.get(other_post, comment.id).await,
            Err(CommentServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(other_post, comment.id).await,
            Err(CommentServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_list() {
        let (service, user, post, _) = setup().await;
        let first = service.create(post, user, "one").await.unwrap();
        service.create(post, user, "two").await.unwrap();

        let edited = service.update(post, first.id, " uno ").await.unwrap();
        assert_eq!(edited.text, "uno");
        assert_eq!(edited.created_at, first.created_at);

        let texts: Vec<String> = service
            .list_for_post(post)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["uno", "two"]);

        service.delete(post, first.id).await.unwrap();
        assert_eq!(service.list_for_post(post).await.unwrap().len(), 1);
    }
}
