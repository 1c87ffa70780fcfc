//! Database layer
//!
//! Works against SQLite (the default, a single file next to the binary) or
//! MySQL, selected by `database.driver` in the configuration. Code outside
//! this module only sees the `DatabasePool` trait object and the
//! repositories built on it.
//!
//! ```ignore
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! let posts = SqlxPostRepository::boxed(pool.clone());
//! ```

pub mod migrations;
pub mod pool;
pub mod query;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
pub use query::{BindValue, PostQuery, Visibility};
