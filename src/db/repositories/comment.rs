//! Comment repository
//!
//! Database operations for post comments. Comments are always read in
//! creation order, oldest first.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Comment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment stamped with the current time
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of a post, oldest first
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>>;

    /// Replace the text; `created_at` is left untouched
    async fn update_text(&self, id: i64, text: &str) -> Result<Comment>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_comment_sqlite(self.pool.sqlite()?, post_id, author_id, text).await?
            }
            DatabaseDriver::Mysql => {
                create_comment_mysql(self.pool.mysql()?, post_id, author_id, text).await?
            }
        };
        self.get_by_id(id)
            .await?
            .context("Comment not found after insert")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_comment_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_comment_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_comments_sqlite(self.pool.sqlite()?, post_id).await,
            DatabaseDriver::Mysql => list_comments_mysql(self.pool.mysql()?, post_id).await,
        }
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_comment_sqlite(self.pool.sqlite()?, id, text).await?,
            DatabaseDriver::Mysql => update_comment_mysql(self.pool.mysql()?, id, text).await?,
        }
        self.get_by_id(id)
            .await?
            .context("Comment not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_comment_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_comment_mysql(self.pool.mysql()?, id).await,
        }
    }
}

const INSERT_COMMENT: &str =
    "INSERT INTO comments (text, post_id, author_id, created_at) VALUES (?, ?, ?, ?)";

const SELECT_COMMENT: &str = r#"
    SELECT cm.id, cm.text, cm.post_id, cm.author_id, cm.created_at, u.username AS author_username
    FROM comments cm
    INNER JOIN users u ON u.id = cm.author_id
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> Result<i64> {
    let result = sqlx::query(INSERT_COMMENT)
        .bind(text)
        .bind(post_id)
        .bind(author_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create comment")?;
    Ok(result.last_insert_rowid())
}

async fn get_comment_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("{} WHERE cm.id = ?", SELECT_COMMENT))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    row.as_ref().map(row_to_comment_sqlite).transpose()
}

async fn list_comments_sqlite(pool: &SqlitePool, post_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&format!(
        "{} WHERE cm.post_id = ? ORDER BY cm.created_at ASC, cm.id ASC",
        SELECT_COMMENT
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")?;

    rows.iter().map(row_to_comment_sqlite).collect()
}

async fn update_comment_sqlite(pool: &SqlitePool, id: i64, text: &str) -> Result<()> {
    sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
        .bind(text)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;
    Ok(())
}

async fn delete_comment_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;
    Ok(())
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.get("id"),
        text: row.get("text"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(
    pool: &MySqlPool,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> Result<i64> {
    let result = sqlx::query(INSERT_COMMENT)
        .bind(text)
        .bind(post_id)
        .bind(author_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create comment")?;
    Ok(result.last_insert_id() as i64)
}

async fn get_comment_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("{} WHERE cm.id = ?", SELECT_COMMENT))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    row.as_ref().map(row_to_comment_mysql).transpose()
}

async fn list_comments_mysql(pool: &MySqlPool, post_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&format!(
        "{} WHERE cm.post_id = ? ORDER BY cm.created_at ASC, cm.id ASC",
        SELECT_COMMENT
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")?;

    rows.iter().map(row_to_comment_mysql).collect()
}

async fn update_comment_mysql(pool: &MySqlPool, id: i64, text: &str) -> Result<()> {
    sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
        .bind(text)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;
    Ok(())
}

async fn delete_comment_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;
    Ok(())
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Comment> {
    Ok(Comment {
        id: row.get("id"),
        text: row.get("text"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        created_at: row.get("created_at"),
    })
}
