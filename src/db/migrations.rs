//! Embedded schema migrations
//!
//! Every migration carries one SQL script per driver. Applied versions are
//! recorded in the `_migrations` table, so `run_migrations` is idempotent
//! and safe to call on every start.
//!
//! ```ignore
//! use vitrine::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Timestamps compared in queries (`expires_at`, `window_start`,
//! `deleted_at`, `publish_date`) are always bound from Rust so both sides of
//! a comparison share one encoding.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::{Backend, DynDatabasePool};

/// A schema migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique, increasing version number
    pub version: i32,
    pub name: &'static str,
    pub up_sqlite: &'static str,
    pub up_mysql: &'static str,
}

/// Row of the `_migrations` table
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_admins",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'editor',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                last_login_at TIMESTAMP NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS admins (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'editor',
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                last_login_at DATETIME(6) NULL,
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token VARCHAR(64) PRIMARY KEY,
                admin_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (admin_id) REFERENCES admins(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_admin_id ON sessions(admin_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token VARCHAR(64) PRIMARY KEY,
                admin_id BIGINT NOT NULL,
                expires_at DATETIME(6) NOT NULL,
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                FOREIGN KEY (admin_id) REFERENCES admins(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_admin_id ON sessions(admin_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                body TEXT NOT NULL,
                is_draft BOOLEAN NOT NULL DEFAULT 1,
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                category VARCHAR(100) NULL,
                publish_date TIMESTAMP NULL,
                deleted_at TIMESTAMP NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_articles_visibility ON articles(is_draft, deleted_at);
            CREATE INDEX IF NOT EXISTS idx_articles_publish_date ON articles(publish_date);
            CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                body LONGTEXT NOT NULL,
                is_draft BOOLEAN NOT NULL DEFAULT TRUE,
                is_featured BOOLEAN NOT NULL DEFAULT FALSE,
                category VARCHAR(100) NULL,
                publish_date DATETIME(6) NULL,
                deleted_at DATETIME(6) NULL,
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
            );
            CREATE INDEX idx_articles_visibility ON articles(is_draft, deleted_at);
            CREATE INDEX idx_articles_publish_date ON articles(publish_date);
            CREATE INDEX idx_articles_category ON articles(category);
        "#,
    },
    Migration {
        version: 4,
        name: "create_article_images",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS article_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                url VARCHAR(500) NOT NULL,
                alt VARCHAR(255) NULL,
                position INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_article_images_article ON article_images(article_id, position);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS article_images (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                article_id BIGINT NOT NULL,
                url VARCHAR(500) NOT NULL,
                alt VARCHAR(255) NULL,
                position INT NOT NULL DEFAULT 0,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_article_images_article ON article_images(article_id, position);
        "#,
    },
    Migration {
        version: 5,
        name: "create_legal_pages",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS legal_pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                title VARCHAR(200) NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS legal_pages (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                title VARCHAR(200) NOT NULL,
                content LONGTEXT NOT NULL,
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
            );
        "#,
    },
    Migration {
        version: 6,
        name: "create_messages",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL,
                phone VARCHAR(40) NULL,
                company VARCHAR(120) NULL,
                subject VARCHAR(200) NULL,
                message TEXT NOT NULL,
                is_read BOOLEAN NOT NULL DEFAULT 0,
                is_archived BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_messages_inbox ON messages(is_archived, is_read);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS messages (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL,
                phone VARCHAR(40) NULL,
                company VARCHAR(120) NULL,
                subject VARCHAR(200) NULL,
                message TEXT NOT NULL,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                is_archived BOOLEAN NOT NULL DEFAULT FALSE,
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
            );
            CREATE INDEX idx_messages_inbox ON messages(is_archived, is_read);
        "#,
    },
    Migration {
        version: 7,
        name: "create_catalog_tables",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS services (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(100) NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS steps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(100) NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS audiences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(100) NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS services (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(100) NULL,
                sort_order INT NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
            );
            CREATE TABLE IF NOT EXISTS steps (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(100) NULL,
                sort_order INT NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
            );
            CREATE TABLE IF NOT EXISTS audiences (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(100) NULL,
                sort_order INT NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
            );
        "#,
    },
    Migration {
        version: 8,
        name: "create_global_settings",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS global_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_name VARCHAR(200) NOT NULL,
                contact_email VARCHAR(255) NULL,
                contact_phone VARCHAR(40) NULL,
                address VARCHAR(500) NULL,
                linkedin_url VARCHAR(500) NULL,
                instagram_url VARCHAR(500) NULL,
                facebook_url VARCHAR(500) NULL,
                twitter_url VARCHAR(500) NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS global_settings (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                site_name VARCHAR(200) NOT NULL,
                contact_email VARCHAR(255) NULL,
                contact_phone VARCHAR(40) NULL,
                address VARCHAR(500) NULL,
                linkedin_url VARCHAR(500) NULL,
                instagram_url VARCHAR(500) NULL,
                facebook_url VARCHAR(500) NULL,
                twitter_url VARCHAR(500) NULL,
                updated_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
            );
        "#,
    },
    Migration {
        version: 9,
        name: "create_rate_limits",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS rate_limits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ip VARCHAR(64) NOT NULL,
                action VARCHAR(50) NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                window_start TIMESTAMP NOT NULL,
                UNIQUE (ip, action)
            );
            CREATE INDEX IF NOT EXISTS idx_rate_limits_window ON rate_limits(window_start);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS rate_limits (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                ip VARCHAR(64) NOT NULL,
                action VARCHAR(50) NOT NULL,
                count BIGINT NOT NULL DEFAULT 0,
                window_start DATETIME(6) NOT NULL,
                UNIQUE KEY uq_rate_limits_ip_action (ip, action)
            );
            CREATE INDEX idx_rate_limits_window ON rate_limits(window_start);
        "#,
    },
];

/// Apply every migration not yet recorded in `_migrations`.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;
    for migration in MIGRATIONS {
        if applied_versions.contains(&i64::from(migration.version)) {
            continue;
        }
        tracing::info!(
            "Applying migration {}: {}",
            migration.version,
            migration.name
        );
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.backend() {
        Backend::Sqlite(_) => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        Backend::Mysql(_) => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.backend() {
        Backend::Sqlite(pool) => get_applied_migrations_sqlite(pool).await,
        Backend::Mysql(pool) => get_applied_migrations_mysql(pool).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.backend() {
        Backend::Sqlite(pool) => {
            for statement in split_sql_statements(migration.up_sqlite) {
                sqlx::query(statement)
                    .execute(pool)
                    .await
                    .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
            }
            sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
                .bind(i64::from(migration.version))
                .bind(migration.name)
                .execute(pool)
                .await?;
        }
        Backend::Mysql(pool) => {
            for statement in split_sql_statements(migration.up_mysql) {
                sqlx::query(statement)
                    .execute(pool)
                    .await
                    .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
            }
            sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
                .bind(i64::from(migration.version))
                .bind(migration.name)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a script into statements, dropping empty and comment-only chunks
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}
