//! Rate-limit repository
//!
//! Fixed-window counters keyed by `(ip, action)`. A window is "stale" once
//! its start is older than the cutoff handed in by the caller; the next
//! increment then restarts it at 1.

use crate::db::{Backend, DynDatabasePool};
use crate::models::RateLimit;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    async fn get(&self, ip: &str, action: &str) -> Result<Option<RateLimit>>;

    /// Add one hit, restarting the window at `now` if it began at or before
    /// `stale_before`
    async fn increment(
        &self,
        ip: &str,
        action: &str,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<()>;

    /// Drop counters whose window began at or before `stale_before`
    async fn delete_stale(&self, stale_before: DateTime<Utc>) -> Result<u64>;
}

pub struct SqlxRateLimitRepository {
    pool: DynDatabasePool,
}

impl SqlxRateLimitRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RateLimitRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_RATE_LIMIT: &str =
    "SELECT ip, action, count, window_start FROM rate_limits WHERE ip = ? AND action = ?";

#[async_trait]
impl RateLimitRepository for SqlxRateLimitRepository {
    async fn get(&self, ip: &str, action: &str) -> Result<Option<RateLimit>> {
        let limit = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(SELECT_RATE_LIMIT)
                .bind(ip)
                .bind(action)
                .fetch_optional(pool)
                .await
                .context("Failed to read rate limit")?
                .map(|row| RateLimit {
                    ip: row.get("ip"),
                    action: row.get("action"),
                    count: row.get("count"),
                    window_start: row.get("window_start"),
                }),
            Backend::Mysql(pool) => sqlx::query(SELECT_RATE_LIMIT)
                .bind(ip)
                .bind(action)
                .fetch_optional(pool)
                .await
                .context("Failed to read rate limit")?
                .map(|row| RateLimit {
                    ip: row.get("ip"),
                    action: row.get("action"),
                    count: row.get("count"),
                    window_start: row.get("window_start"),
                }),
        };
        Ok(limit)
    }

    async fn increment(
        &self,
        ip: &str,
        action: &str,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO rate_limits (ip, action, count, window_start)
                    VALUES (?, ?, 1, ?)
                    ON CONFLICT(ip, action) DO UPDATE SET
                        count = CASE WHEN rate_limits.window_start <= ? THEN 1 ELSE rate_limits.count + 1 END,
                        window_start = CASE WHEN rate_limits.window_start <= ? THEN excluded.window_start ELSE rate_limits.window_start END
                    "#,
                )
                .bind(ip)
                .bind(action)
                .bind(now)
                .bind(stale_before)
                .bind(stale_before)
                .execute(pool)
                .await
                .context("Failed to increment rate limit")?;
            }
            Backend::Mysql(pool) => {
                // MySQL applies the assignments in order; `count` must be
                // computed while `window_start` still holds the old value.
                sqlx::query(
                    r#"
                    INSERT INTO rate_limits (ip, action, count, window_start)
                    VALUES (?, ?, 1, ?)
                    ON DUPLICATE KEY UPDATE
                        count = IF(window_start <= ?, 1, count + 1),
                        window_start = IF(window_start <= ?, VALUES(window_start), window_start)
                    "#,
                )
                .bind(ip)
                .bind(action)
                .bind(now)
                .bind(stale_before)
                .bind(stale_before)
                .execute(pool)
                .await
                .context("Failed to increment rate limit")?;
            }
        }
        Ok(())
    }

    async fn delete_stale(&self, stale_before: DateTime<Utc>) -> Result<u64> {
        let sql = "DELETE FROM rate_limits WHERE window_start <= ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(stale_before)
                .execute(pool)
                .await
                .context("Failed to delete stale rate limits")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(stale_before)
                .execute(pool)
                .await
                .context("Failed to delete stale rate limits")?
                .rows_affected(),
        };
        Ok(affected)
    }
}
