//! Post query builder
//!
//! `PostQuery` is a composable description of a post listing: which posts a
//! viewer may see, extra filters, whether to count comments, and an
//! optional page window. It renders to SQL with `?` placeholders plus the
//! values to bind, which is valid for both SQLite and MySQL.
//!
//! ```ignore
//! let (sql, binds) = PostQuery::visible_to(Some(user.id), Utc::now())
//!     .by_author(user.id)
//!     .with_comment_count()
//!     .paginate(0, 10)
//!     .to_sql();
//! ```

use chrono::{DateTime, Utc};

/// Which posts a query may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No visibility filter
    All,
    /// Published post, published category, `pub_date <= now`
    Published { now: DateTime<Utc> },
    /// Published posts plus every post written by `viewer`
    AuthoredOrPublished { viewer: i64, now: DateTime<Utc> },
}

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindValue {
    Int(i64),
    Time(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    visibility: Visibility,
    author_id: Option<i64>,
    category_id: Option<i64>,
    post_id: Option<i64>,
    comment_count: bool,
    window: Option<(i64, i64)>,
}

const POST_COLUMNS: &str = "p.id, p.title, p.text, p.pub_date, p.image, p.is_published, \
     p.author_id, p.location_id, p.category_id, p.created_at, \
     u.username AS author_username, \
     c.title AS category_title, c.slug AS category_slug, c.is_published AS category_is_published, \
     l.name AS location_name, l.is_published AS location_is_published";

const POST_JOINS: &str = "FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN categories c ON c.id = p.category_id \
     LEFT JOIN locations l ON l.id = p.location_id";

const COMMENT_COUNT_COLUMN: &str =
    "(SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count";

const PUBLISHED_PREDICATE: &str =
    "(p.is_published = 1 AND c.is_published = 1 AND p.pub_date <= ?)";

const ORDERING: &str = "ORDER BY p.pub_date DESC, p.title ASC";

impl PostQuery {
    /// Every post, regardless of visibility
    pub fn all() -> Self {
        Self {
            visibility: Visibility::All,
            author_id: None,
            category_id: None,
            post_id: None,
            comment_count: false,
            window: None,
        }
    }

    /// Posts anyone may read at `now`
    pub fn published(now: DateTime<Utc>) -> Self {
        Self {
            visibility: Visibility::Published { now },
            ..Self::all()
        }
    }

    /// Posts `viewer` may read at `now`. An anonymous viewer gets exactly
    /// [`PostQuery::published`].
    pub fn visible_to(viewer: Option<i64>, now: DateTime<Utc>) -> Self {
        match viewer {
            None => Self::published(now),
            Some(viewer) => Self {
                visibility: Visibility::AuthoredOrPublished { viewer, now },
                ..Self::all()
            },
        }
    }

    /// Add a `comment_count` column
    pub fn with_comment_count(mut self) -> Self {
        self.comment_count = true;
        self
    }

    pub fn by_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_id(mut self, post_id: i64) -> Self {
        self.post_id = Some(post_id);
        self
    }

    /// Restrict the rows to `limit` items starting at `offset`
    pub fn paginate(mut self, offset: i64, limit: i64) -> Self {
        self.window = Some((offset, limit));
        self
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether rendered rows carry a `comment_count` column
    pub fn counts_comments(&self) -> bool {
        self.comment_count
    }

    /// Render the row query
    pub fn to_sql(&self) -> (String, Vec<BindValue>) {
        let mut columns = POST_COLUMNS.to_string();
        if self.comment_count {
            columns.push_str(", ");
            columns.push_str(COMMENT_COUNT_COLUMN);
        }

        let (where_clause, mut binds) = self.where_clause();
        let mut sql = format!("SELECT {} {}{} {}", columns, POST_JOINS, where_clause, ORDERING);

        if let Some((offset, limit)) = self.window {
            sql.push_str(" LIMIT ? OFFSET ?");
            binds.push(BindValue::Int(limit));
            binds.push(BindValue::Int(offset));
        }

        (sql, binds)
    }

    /// Render a `SELECT COUNT(*) AS total` over the same filters, ignoring
    /// the page window
    pub fn to_count_sql(&self) -> (String, Vec<BindValue>) {
        let (where_clause, binds) = self.where_clause();
        (
            format!("SELECT COUNT(*) AS total {}{}", POST_JOINS, where_clause),
            binds,
        )
    }

    fn where_clause(&self) -> (String, Vec<BindValue>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut binds = Vec::new();

        match self.visibility {
            Visibility::All => {}
            Visibility::Published { now } => {
                conditions.push(PUBLISHED_PREDICATE.to_string());
                binds.push(BindValue::Time(now));
            }
            Visibility::AuthoredOrPublished { viewer, now } => {
                conditions.push(format!("({} OR p.author_id = ?)", PUBLISHED_PREDICATE));
                binds.push(BindValue::Time(now));
                binds.push(BindValue::Int(viewer));
            }
        }

        let filters = [
            ("p.author_id = ?", self.author_id),
            ("p.category_id = ?", self.category_id),
            ("p.id = ?", self.post_id),
        ];
        for (condition, value) in filters {
            if let Some(value) = value {
                conditions.push(condition.to_string());
                binds.push(BindValue::Int(value));
            }
        }

        if conditions.is_empty() {
            (String::new(), binds)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), binds)
        }
    }
}
