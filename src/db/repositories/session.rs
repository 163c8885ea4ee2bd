//! Session repository
//!
//! Database operations for admin login sessions.

use crate::db::{Backend, DynDatabasePool};
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Look a session up by its token, expired or not
    async fn get_by_token(&self, token: &str) -> Result<Option<Session>>;

    /// Delete a session; returns whether a row matched
    async fn delete(&self, token: &str) -> Result<bool>;

    async fn delete_by_admin(&self, admin_id: i64) -> Result<u64>;

    /// Delete every session whose expiry is before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// SQLx-based session repository for SQLite and MySQL
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        let sql = r#"
            INSERT INTO sessions (token, admin_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
        "#;
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(sql)
                    .bind(&session.token)
                    .bind(session.admin_id)
                    .bind(session.expires_at)
                    .bind(session.created_at)
                    .execute(pool)
                    .await
                    .context("Failed to create session")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(sql)
                    .bind(&session.token)
                    .bind(session.admin_id)
                    .bind(session.expires_at)
                    .bind(session.created_at)
                    .execute(pool)
                    .await
                    .context("Failed to create session")?;
            }
        }
        Ok(session.clone())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<Session>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_session_sqlite(pool, token).await,
            Backend::Mysql(pool) => get_session_mysql(pool, token).await,
        }
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        let sql = "DELETE FROM sessions WHERE token = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(token)
                .execute(pool)
                .await
                .context("Failed to delete session")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(token)
                .execute(pool)
                .await
                .context("Failed to delete session")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn delete_by_admin(&self, admin_id: i64) -> Result<u64> {
        let sql = "DELETE FROM sessions WHERE admin_id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(admin_id)
                .execute(pool)
                .await
                .context("Failed to delete sessions by admin")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(admin_id)
                .execute(pool)
                .await
                .context("Failed to delete sessions by admin")?
                .rows_affected(),
        };
        Ok(affected)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let sql = "DELETE FROM sessions WHERE expires_at < ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected(),
        };
        Ok(affected)
    }
}

const SELECT_SESSION: &str =
    "SELECT token, admin_id, expires_at, created_at FROM sessions WHERE token = ?";

async fn get_session_sqlite(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    let row = sqlx::query(SELECT_SESSION)
        .bind(token)
        .fetch_optional(pool)
        .await
        .context("Failed to get session")?;

    Ok(row.map(|row| Session {
        token: row.get("token"),
        admin_id: row.get("admin_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn get_session_mysql(pool: &MySqlPool, token: &str) -> Result<Option<Session>> {
    let row = sqlx::query(SELECT_SESSION)
        .bind(token)
        .fetch_optional(pool)
        .await
        .context("Failed to get session")?;

    Ok(row.map(|row| Session {
        token: row.get("token"),
        admin_id: row.get("admin_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{AdminRepository, SqlxAdminRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Admin, AdminRole};
    use chrono::Duration;

    async fn setup_test_repo() -> (SqlxAdminRepository, SqlxSessionRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxAdminRepository::new(pool.clone()),
            SqlxSessionRepository::new(pool),
        )
    }

    async fn create_test_admin(repo: &SqlxAdminRepository, email: &str) -> Admin {
        repo.create(&Admin::new(email.to_string(), "hash".into(), AdminRole::Admin))
            .await
            .expect("Failed to create test admin")
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (admins, repo) = setup_test_repo().await;
        let admin = create_test_admin(&admins, "a@example.com").await;

        let session = Session::new(admin.id, Duration::days(7));
        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .get_by_token(&session.token)
            .await
            .expect("Failed to get session")
            .expect("Session not found");
        assert_eq!(found.admin_id, admin.id);
        assert!(!found.is_expired());
    }

    #[tokio::test]
    async fn test_get_unknown_token() {
        let (_, repo) = setup_test_repo().await;
        assert!(repo.get_by_token("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (admins, repo) = setup_test_repo().await;
        let admin = create_test_admin(&admins, "a@example.com").await;
        let session = Session::new(admin.id, Duration::days(7));
        repo.create(&session).await.unwrap();

        assert!(repo.delete(&session.token).await.unwrap());
        assert!(repo.get_by_token(&session.token).await.unwrap().is_none());
        assert!(!repo.delete(&session.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_admin_leaves_others() {
        let (admins, repo) = setup_test_repo().await;
        let first = create_test_admin(&admins, "a@example.com").await;
        let second = create_test_admin(&admins, "b@example.com").await;

        repo.create(&Session::new(first.id, Duration::days(7))).await.unwrap();
        repo.create(&Session::new(first.id, Duration::days(7))).await.unwrap();
        let kept = Session::new(second.id, Duration::days(7));
        repo.create(&kept).await.unwrap();

        assert_eq!(repo.delete_by_admin(first.id).await.unwrap(), 2);
        assert!(repo.get_by_token(&kept.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let (admins, repo) = setup_test_repo().await;
        let admin = create_test_admin(&admins, "a@example.com").await;

        let expired = Session::new(admin.id, Duration::hours(-1));
        let valid = Session::new(admin.id, Duration::days(1));
        repo.create(&expired).await.unwrap();
        repo.create(&valid).await.unwrap();

        assert_eq!(repo.delete_expired(Utc::now()).await.unwrap(), 1);
        assert!(repo.get_by_token(&expired.token).await.unwrap().is_none());
        assert!(repo.get_by_token(&valid.token).await.unwrap().is_some());
    }
}
