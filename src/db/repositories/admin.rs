//! Admin repository
//!
//! Database access for back-office accounts.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Admin, AdminRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Insert an account and return it with its assigned id
    async fn create(&self, admin: &Admin) -> Result<Admin>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>>;

    /// Case-insensitive lookup by email
    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>>;

    async fn count(&self) -> Result<i64>;

    async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    async fn set_active(&self, id: i64, is_active: bool) -> Result<()>;
}

/// SQLx-based admin repository for SQLite and MySQL
pub struct SqlxAdminRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn create(&self, admin: &Admin) -> Result<Admin> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_admin_sqlite(pool, admin).await,
            Backend::Mysql(pool) => create_admin_mysql(pool, admin).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_admin_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_admin_by_id_mysql(pool, id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let email = email.trim().to_lowercase();
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_admin_by_email_sqlite(pool, &email).await,
            Backend::Mysql(pool) => get_admin_by_email_mysql(pool, &email).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS total FROM admins";
        let total = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql).fetch_one(pool).await?.get("total"),
            Backend::Mysql(pool) => sqlx::query(sql).fetch_one(pool).await?.get("total"),
        };
        Ok(total)
    }

    async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let sql = "UPDATE admins SET last_login_at = ? WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(sql)
                    .bind(at)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update last login")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(sql)
                    .bind(at)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update last login")?;
            }
        }
        Ok(())
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<()> {
        let sql = "UPDATE admins SET is_active = ? WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(sql)
                    .bind(is_active)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update admin status")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(sql)
                    .bind(is_active)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update admin status")?;
            }
        }
        Ok(())
    }
}

const ADMIN_COLUMNS: &str =
    "id, email, password_hash, role, is_active, last_login_at, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_admin_sqlite(pool: &SqlitePool, admin: &Admin) -> Result<Admin> {
    let email = admin.email.trim().to_lowercase();
    let result = sqlx::query(
        r#"
        INSERT INTO admins (email, password_hash, role, is_active, last_login_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&email)
    .bind(&admin.password_hash)
    .bind(admin.role.as_str())
    .bind(admin.is_active)
    .bind(admin.last_login_at)
    .bind(admin.created_at)
    .execute(pool)
    .await
    .context("Failed to create admin")?;

    Ok(Admin {
        id: result.last_insert_rowid(),
        email,
        ..admin.clone()
    })
}

async fn get_admin_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Admin>> {
    let sql = format!("SELECT {} FROM admins WHERE id = ?", ADMIN_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get admin by ID")?;

    row.as_ref().map(row_to_admin_sqlite).transpose()
}

async fn get_admin_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<Admin>> {
    let sql = format!("SELECT {} FROM admins WHERE email = ?", ADMIN_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get admin by email")?;

    row.as_ref().map(row_to_admin_sqlite).transpose()
}

fn row_to_admin_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Admin> {
    let role: String = row.get("role");
    Ok(Admin {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: AdminRole::from_str(&role)?,
        is_active: row.get("is_active"),
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_admin_mysql(pool: &MySqlPool, admin: &Admin) -> Result<Admin> {
    let email = admin.email.trim().to_lowercase();
    let result = sqlx::query(
        r#"
        INSERT INTO admins (email, password_hash, role, is_active, last_login_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&email)
    .bind(&admin.password_hash)
    .bind(admin.role.as_str())
    .bind(admin.is_active)
    .bind(admin.last_login_at)
    .bind(admin.created_at)
    .execute(pool)
    .await
    .context("Failed to create admin")?;

    Ok(Admin {
        id: result.last_insert_id() as i64,
        email,
        ..admin.clone()
    })
}

async fn get_admin_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Admin>> {
    let sql = format!("SELECT {} FROM admins WHERE id = ?", ADMIN_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get admin by ID")?;

    row.as_ref().map(row_to_admin_mysql).transpose()
}

async fn get_admin_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<Admin>> {
    let sql = format!("SELECT {} FROM admins WHERE email = ?", ADMIN_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get admin by email")?;

    row.as_ref().map(row_to_admin_mysql).transpose()
}

fn row_to_admin_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Admin> {
    let role: String = row.get("role");
    Ok(Admin {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: AdminRole::from_str(&role)?,
        is_active: row.get("is_active"),
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
    })
}
