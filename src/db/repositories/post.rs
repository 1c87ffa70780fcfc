//! Post repository
//!
//! Reads go through [`PostQuery`] so every listing shares one visibility
//! rule and one ordering. Writes take the resolved create/update inputs.

use crate::config::DatabaseDriver;
use crate::db::query::{BindValue, PostQuery};
use crate::db::DynDatabasePool;
use crate::models::{CreatePostInput, Post, PostCategory, PostLocation, UpdatePostInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{MySql, MySqlPool, Row, Sqlite, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Posts matching the query, in its ordering
    async fn fetch(&self, query: &PostQuery) -> Result<Vec<Post>>;

    /// Number of posts matching the query, ignoring its page window
    async fn count(&self, query: &PostQuery) -> Result<i64>;

    /// First post matching the query
    async fn fetch_one(&self, query: &PostQuery) -> Result<Option<Post>> {
        Ok(self.fetch(query).await?.into_iter().next())
    }

    /// A post by id, whatever its visibility
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        self.fetch_one(&PostQuery::all().with_id(id)).await
    }

    /// Insert a post written by `author_id`
    async fn create(&self, author_id: i64, input: &CreatePostInput) -> Result<Post>;

    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Post>;

    /// Delete a post and, through the foreign key, its comments
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn fetch(&self, query: &PostQuery) -> Result<Vec<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_posts_sqlite(self.pool.sqlite()?, query).await,
            DatabaseDriver::Mysql => fetch_posts_mysql(self.pool.mysql()?, query).await,
        }
    }

    async fn count(&self, query: &PostQuery) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_posts_sqlite(self.pool.sqlite()?, query).await,
            DatabaseDriver::Mysql => count_posts_mysql(self.pool.mysql()?, query).await,
        }
    }

    async fn create(&self, author_id: i64, input: &CreatePostInput) -> Result<Post> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_post_sqlite(self.pool.sqlite()?, author_id, input).await?
            }
            DatabaseDriver::Mysql => create_post_mysql(self.pool.mysql()?, author_id, input).await?,
        };
        self.get_by_id(id)
            .await?
            .context("Post not found after insert")
    }

    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_post_sqlite(self.pool.sqlite()?, id, input).await?,
            DatabaseDriver::Mysql => update_post_mysql(self.pool.mysql()?, id, input).await?,
        }
        self.get_by_id(id)
            .await?
            .context("Post not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_post_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_post_mysql(self.pool.mysql()?, id).await,
        }
    }
}

const INSERT_POST: &str = r#"
    INSERT INTO posts (title, text, pub_date, image, is_published, author_id, location_id, category_id, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

// A NULL pub_date, image or is_published keeps the stored value.
const UPDATE_POST: &str = r#"
    UPDATE posts
    SET title = ?, text = ?, pub_date = COALESCE(?, pub_date), image = COALESCE(?, image),
        is_published = COALESCE(?, is_published), location_id = ?, category_id = ?
    WHERE id = ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

fn bind_sqlite<'q>(
    sql: &'q str,
    binds: &[BindValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    binds
        .iter()
        .fold(sqlx::query(sql), |query, value| match *value {
            BindValue::Int(v) => query.bind(v),
            BindValue::Time(t) => query.bind(t),
        })
}

async fn fetch_posts_sqlite(pool: &SqlitePool, query: &PostQuery) -> Result<Vec<Post>> {
    let (sql, binds) = query.to_sql();
    let rows = bind_sqlite(&sql, &binds)
        .fetch_all(pool)
        .await
        .context("Failed to fetch posts")?;

    rows.iter()
        .map(|row| row_to_post_sqlite(row, query.counts_comments()))
        .collect()
}

async fn count_posts_sqlite(pool: &SqlitePool, query: &PostQuery) -> Result<i64> {
    let (sql, binds) = query.to_count_sql();
    let row = bind_sqlite(&sql, &binds)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    Ok(row.get("total"))
}

async fn create_post_sqlite(
    pool: &SqlitePool,
    author_id: i64,
    input: &CreatePostInput,
) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_POST)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date.unwrap_or(now))
        .bind(&input.image)
        .bind(input.is_published)
        .bind(author_id)
        .bind(input.location_id)
        .bind(input.category_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(result.last_insert_rowid())
}

async fn update_post_sqlite(pool: &SqlitePool, id: i64, input: &UpdatePostInput) -> Result<()> {
    sqlx::query(UPDATE_POST)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date)
        .bind(&input.image)
        .bind(input.is_published)
        .bind(input.location_id)
        .bind(input.category_id)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update post")?;
    Ok(())
}

async fn delete_post_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}

fn row_to_post_sqlite(row: &SqliteRow, counted: bool) -> Result<Post> {
    let category = match row.try_get::<Option<i64>, _>("category_id")? {
        Some(id) => Some(PostCategory {
            id,
            title: row.try_get("category_title")?,
            slug: row.try_get("category_slug")?,
            is_published: row.try_get("category_is_published")?,
        }),
        None => None,
    };
    let location = match row.try_get::<Option<i64>, _>("location_id")? {
        Some(id) => Some(PostLocation {
            id,
            name: row.try_get("location_name")?,
            is_published: row.try_get("location_is_published")?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
        image: row.try_get("image")?,
        is_published: row.try_get("is_published")?,
        author_id: row.try_get("author_id")?,
        author_username: row.try_get("author_username")?,
        category,
        location,
        created_at: row.try_get("created_at")?,
        comment_count: if counted {
            Some(row.try_get("comment_count")?)
        } else {
            None
        },
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

fn bind_mysql<'q>(sql: &'q str, binds: &[BindValue]) -> Query<'q, MySql, MySqlArguments> {
    binds
        .iter()
        .fold(sqlx::query(sql), |query, value| match *value {
            BindValue::Int(v) => query.bind(v),
            BindValue::Time(t) => query.bind(t),
        })
}

async fn fetch_posts_mysql(pool: &MySqlPool, query: &PostQuery) -> Result<Vec<Post>> {
    let (sql, binds) = query.to_sql();
    let rows = bind_mysql(&sql, &binds)
        .fetch_all(pool)
        .await
        .context("Failed to fetch posts")?;

    rows.iter()
        .map(|row| row_to_post_mysql(row, query.counts_comments()))
        .collect()
}

async fn count_posts_mysql(pool: &MySqlPool, query: &PostQuery) -> Result<i64> {
    let (sql, binds) = query.to_count_sql();
    let row = bind_mysql(&sql, &binds)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    Ok(row.get("total"))
}

async fn create_post_mysql(pool: &MySqlPool, author_id: i64, input: &CreatePostInput) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_POST)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date.unwrap_or(now))
        .bind(&input.image)
        .bind(input.is_published)
        .bind(author_id)
        .bind(input.location_id)
        .bind(input.category_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(result.last_insert_id() as i64)
}

async fn update_post_mysql(pool: &MySqlPool, id: i64, input: &UpdatePostInput) -> Result<()> {
    sqlx::query(UPDATE_POST)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date)
        .bind(&input.image)
        .bind(input.is_published)
        .bind(input.location_id)
        .bind(input.category_id)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update post")?;
    Ok(())
}

async fn delete_post_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}

fn row_to_post_mysql(row: &MySqlRow, counted: bool) -> Result<Post> {
    let category = match row.try_get::<Option<i64>, _>("category_id")? {
        Some(id) => Some(PostCategory {
            id,
            title: row.try_get("category_title")?,
            slug: row.try_get("category_slug")?,
            is_published: row.try_get("category_is_published")?,
        }),
        None => None,
    };
    let location = match row.try_get::<Option<i64>, _>("location_id")? {
        Some(id) => Some(PostLocation {
            id,
            name: row.try_get("location_name")?,
            is_published: row.try_get("location_is_published")?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
        image: row.try_get("image")?,
        is_published: row.try_get("is_published")?,
        author_id: row.try_get("author_id")?,
        author_username: row.try_get("author_username")?,
        category,
        location,
        created_at: row.try_get("created_at")?,
        comment_count: if counted {
            Some(row.try_get("comment_count")?)
        } else {
            None
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        CategoryRepository, LocationRepository, SqlxCategoryRepository, SqlxLocationRepository,
        SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Category, Location, User};
    use chrono::{DateTime, Duration};

    struct Fixture {
        pool: DynDatabasePool,
        repo: SqlxPostRepository,
        author: i64,
        reader: i64,
        published: i64,
        hidden: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("author".to_string(), String::new(), "hash".to_string()))
            .await
            .unwrap()
            .id;
        let reader = users
            .create(&User::new("reader".to_string(), String::new(), "hash".to_string()))
            .await
            .unwrap()
            .id;

        let categories = SqlxCategoryRepository::new(pool.clone());
        let published = categories
            .create(&Category::new("Open".to_string(), String::new(), "open".to_string()))
            .await
            .unwrap()
            .id;
        let mut closed = Category::new("Closed".to_string(), String::new(), "closed".to_string());
        closed.is_published = false;
        let hidden = categories.create(&closed).await.unwrap().id;

        Fixture {
            repo: SqlxPostRepository::new(pool.clone()),
            pool,
            author,
            reader,
            published,
            hidden,
        }
    }

    fn input(
        title: &str,
        pub_date: DateTime<Utc>,
        is_published: bool,
        category_id: Option<i64>,
    ) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            text: format!("{} body", title),
            pub_date: Some(pub_date),
            image: None,
            is_published,
            location_id: None,
            category_id,
        }
    }

    fn titles(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_joins_relations() {
        let f = setup().await;
        let location = SqlxLocationRepository::new(f.pool.clone())
            .create(&Location::new("Oslo".to_string()))
            .await
            .unwrap();

        let mut new_post = input("First", Utc::now(), true, Some(f.published));
        new_post.location_id = Some(location.id);
        let post = f.repo.create(f.author, &new_post).await.expect("Failed to create post");

        assert_eq!(post.author_id, f.author);
        assert_eq!(post.author_username, "author");
        assert_eq!(post.category.as_ref().map(|c| c.slug.as_str()), Some("open"));
        assert_eq!(post.location.as_ref().map(|l| l.name.as_str()), Some("Oslo"));
        assert!(post.comment_count.is_none());
    }

    #[tokio::test]
    async fn test_published_applies_every_condition() {
        let f = setup().await;
        let now = Utc::now();
        let past = now - Duration::days(1);

        f.repo.create(f.author, &input("visible", past, true, Some(f.published))).await.unwrap();
        f.repo.create(f.author, &input("draft", past, false, Some(f.published))).await.unwrap();
        f.repo.create(f.author, &input("hidden category", past, true, Some(f.hidden))).await.unwrap();
        f.repo.create(f.author, &input("no category", past, true, None)).await.unwrap();
        f.repo
            .create(f.author, &input("scheduled", now + Duration::days(1), true, Some(f.published)))
            .await
            .unwrap();

        let posts = f.repo.fetch(&PostQuery::published(now)).await.unwrap();
        assert_eq!(titles(&posts), vec!["visible"]);
        assert!(posts.iter().all(|p| p.is_publicly_visible(now)));
        assert_eq!(f.repo.count(&PostQuery::published(now)).await.unwrap(), 1);

        let own = f.repo.fetch(&PostQuery::visible_to(Some(f.author), now)).await.unwrap();
        assert_eq!(own.len(), 5);

        let other = f.repo.fetch(&PostQuery::visible_to(Some(f.reader), now)).await.unwrap();
        assert_eq!(titles(&other), vec!["visible"]);
    }

    #[tokio::test]
    async fn test_ordering_newest_first_then_title() {
        let f = setup().await;
        let now = Utc::now();
        let older = now - Duration::days(2);
        let newer = now - Duration::days(1);

        f.repo.create(f.author, &input("b", newer, true, Some(f.published))).await.unwrap();
        f.repo.create(f.author, &input("old", older, true, Some(f.published))).await.unwrap();
        f.repo.create(f.author, &input("a", newer, true, Some(f.published))).await.unwrap();

        let posts = f.repo.fetch(&PostQuery::published(now)).await.unwrap();
        assert_eq!(titles(&posts), vec!["a", "b", "old"]);
    }

    #[tokio::test]
    async fn test_pagination_window_and_count() {
        let f = setup().await;
        let now = Utc::now();
        for i in 0..13 {
            let when = now - Duration::minutes(i + 1);
            f.repo
                .create(f.author, &input(&format!("post {:02}", i), when, true, Some(f.published)))
                .await
                .unwrap();
        }

        let query = PostQuery::published(now).paginate(10, 10);
        let page = f.repo.fetch(&query).await.unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(f.repo.count(&query).await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_comment_count_annotation() {
        let f = setup().await;
        let post = f
            .repo
            .create(f.author, &input("counted", Utc::now(), true, Some(f.published)))
            .await
            .unwrap();
        for text in ["one", "two"] {
            sqlx::query("INSERT INTO comments (text, post_id, author_id, created_at) VALUES (?, ?, ?, ?)")
                .bind(text)
                .bind(post.id)
                .bind(f.reader)
                .bind(Utc::now())
                .execute(f.pool.sqlite().unwrap())
                .await
                .unwrap();
        }

        let counted = f
            .repo
            .fetch_one(&PostQuery::all().with_id(post.id).with_comment_count())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counted.comment_count, Some(2));
    }

    #[tokio::test]
    async fn test_update_keeps_date_and_image_when_absent() {
        let f = setup().await;
        let original_date = Utc::now() - Duration::days(3);
        let mut new_post = input("before", original_date, true, Some(f.published));
        new_post.image = Some("post_images/a.png".to_string());
        let post = f.repo.create(f.author, &new_post).await.unwrap();

        let updated = f
            .repo
            .update(
                post.id,
                &UpdatePostInput {
                    title: "after".to_string(),
                    text: "changed".to_string(),
                    pub_date: None,
                    image: None,
                    is_published: Some(false),
                    location_id: None,
                    category_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "after");
        assert_eq!(updated.pub_date, post.pub_date);
        assert_eq!(updated.image.as_deref(), Some("post_images/a.png"));
        assert!(!updated.is_published);
        assert!(updated.category.is_none());
    }

    #[tokio::test]
    async fn test_update_without_publish_flag_keeps_it() {
        let f = setup().await;
        let post = f
            .repo
            .create(f.author, &input("live", Utc::now(), true, Some(f.published)))
            .await
            .unwrap();

        let updated = f
            .repo
            .update(
                post.id,
                &UpdatePostInput {
                    title: "still live".to_string(),
                    text: "edited".to_string(),
                    pub_date: None,
                    image: None,
                    is_published: None,
                    location_id: None,
                    category_id: Some(f.published),
                },
            )
            .await
            .unwrap();

        assert!(updated.is_published);
        let visible = f.repo.fetch(&PostQuery::published(Utc::now())).await.unwrap();
        assert_eq!(titles(&visible), vec!["still live"]);
    }

    #[tokio::test]
    async fn test_comment_count_is_zero_not_missing() {
        let f = setup().await;
        let post = f
            .repo
            .create(f.author, &input("quiet", Utc::now(), true, Some(f.published)))
            .await
            .unwrap();

        let counted = f
            .repo
            .fetch(&PostQuery::all().with_id(post.id).with_comment_count())
            .await
            .unwrap();
        assert_eq!(counted[0].comment_count, Some(0));

        let plain = f.repo.fetch(&PostQuery::all().with_id(post.id)).await.unwrap();
        assert_eq!(plain[0].comment_count, None);
    }

    #[tokio::test]
    async fn test_deleting_category_or_location_nulls_posts() {
        let f = setup().await;
        let location = SqlxLocationRepository::new(f.pool.clone())
            .create(&Location::new("Oslo".to_string()))
            .await
            .unwrap();
        let mut new_post = input("kept", Utc::now(), true, Some(f.published));
        new_post.location_id = Some(location.id);
        let post = f.repo.create(f.author, &new_post).await.unwrap();

        SqlxCategoryRepository::new(f.pool.clone()).delete(f.published).await.unwrap();
        SqlxLocationRepository::new(f.pool.clone()).delete(location.id).await.unwrap();

        let post = f.repo.get_by_id(post.id).await.unwrap().expect("Post should survive");
        assert!(post.category.is_none());
        assert!(post.location.is_none());
    }

    #[tokio::test]
    async fn test_deleting_author_deletes_posts() {
        let f = setup().await;
        let post = f
            .repo
            .create(f.author, &input("gone", Utc::now(), true, Some(f.published)))
            .await
            .unwrap();

        SqlxUserRepository::new(f.pool.clone()).delete(f.author).await.unwrap();
        assert!(f.repo.get_by_id(post.id).await.unwrap().is_none());
    }
}
