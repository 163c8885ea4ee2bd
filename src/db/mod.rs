//! Database layer
//!
//! SQLite is the default store; MySQL is selected with `database.driver`.
//! The schema is created by the embedded migrations in [`migrations`].
//!
//! ```ignore
//! use vitrine::config::DatabaseConfig;
//! use vitrine::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
