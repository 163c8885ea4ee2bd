//! Catalog repository
//!
//! One implementation serves the `services`, `steps` and `audiences`
//! tables; the table name comes from [`CatalogKind::table`], never from
//! user input.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{CatalogItem, CatalogItemInput, CatalogKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create(&self, kind: CatalogKind, input: &CatalogItemInput) -> Result<CatalogItem>;

    async fn update(&self, kind: CatalogKind, id: i64, input: &CatalogItemInput) -> Result<Option<CatalogItem>>;

    async fn get_by_id(&self, kind: CatalogKind, id: i64) -> Result<Option<CatalogItem>>;

    /// Ordered by `order`, then id. `active_only` hides deactivated items.
    async fn list(&self, kind: CatalogKind, active_only: bool) -> Result<Vec<CatalogItem>>;

    async fn delete(&self, kind: CatalogKind, id: i64) -> Result<bool>;
}

pub struct SqlxCatalogRepository {
    pool: DynDatabasePool,
}

impl SqlxCatalogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CatalogRepository> {
        Arc::new(Self::new(pool))
    }
}

const ITEM_COLUMNS: &str =
    "id, title, description, icon, sort_order, is_active, created_at, updated_at";

fn row_to_item_sqlite(row: &sqlx::sqlite::SqliteRow) -> CatalogItem {
    CatalogItem {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        icon: row.get("icon"),
        order: row.get("sort_order"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_item_mysql(row: &sqlx::mysql::MySqlRow) -> CatalogItem {
    CatalogItem {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        icon: row.get("icon"),
        order: row.get("sort_order"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl CatalogRepository for SqlxCatalogRepository {
    async fn create(&self, kind: CatalogKind, input: &CatalogItemInput) -> Result<CatalogItem> {
        let sql = format!(
            "INSERT INTO {} (title, description, icon, sort_order, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            kind.table()
        );
        let now = Utc::now();
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(&input.title)
                .bind(&input.description)
                .bind(&input.icon)
                .bind(input.order)
                .bind(input.is_active)
                .bind(now)
                .bind(now)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to create {} item", kind))?
                .last_insert_rowid(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(&input.title)
                .bind(&input.description)
                .bind(&input.icon)
                .bind(input.order)
                .bind(input.is_active)
                .bind(now)
                .bind(now)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to create {} item", kind))?
                .last_insert_id() as i64,
        };

        Ok(CatalogItem {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            icon: input.icon.clone(),
            order: input.order,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, kind: CatalogKind, id: i64, input: &CatalogItemInput) -> Result<Option<CatalogItem>> {
        let sql = format!(
            "UPDATE {} SET title = ?, description = ?, icon = ?, sort_order = ?, is_active = ?, updated_at = ? \
             WHERE id = ?",
            kind.table()
        );
        let now = Utc::now();
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(&input.title)
                .bind(&input.description)
                .bind(&input.icon)
                .bind(input.order)
                .bind(input.is_active)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to update {} item", kind))?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(&input.title)
                .bind(&input.description)
                .bind(&input.icon)
                .bind(input.order)
                .bind(input.is_active)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to update {} item", kind))?
                .rows_affected(),
        };
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(kind, id).await
    }

    async fn get_by_id(&self, kind: CatalogKind, id: i64) -> Result<Option<CatalogItem>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", ITEM_COLUMNS, kind.table());
        let item = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .with_context(|| format!("Failed to get {} item", kind))?
                .as_ref()
                .map(row_to_item_sqlite),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .with_context(|| format!("Failed to get {} item", kind))?
                .as_ref()
                .map(row_to_item_mysql),
        };
        Ok(item)
    }

    async fn list(&self, kind: CatalogKind, active_only: bool) -> Result<Vec<CatalogItem>> {
        let filter = if active_only { "WHERE is_active = ?" } else { "" };
        let sql = format!(
            "SELECT {} FROM {} {} ORDER BY sort_order ASC, id ASC",
            ITEM_COLUMNS,
            kind.table(),
            filter
        );
        let items = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut query = sqlx::query(&sql);
                if active_only {
                    query = query.bind(true);
                }
                query
                    .fetch_all(pool)
                    .await
                    .with_context(|| format!("Failed to list {}", kind))?
                    .iter()
                    .map(row_to_item_sqlite)
                    .collect()
            }
            Backend::Mysql(pool) => {
                let mut query = sqlx::query(&sql);
                if active_only {
                    query = query.bind(true);
                }
                query
                    .fetch_all(pool)
                    .await
                    .with_context(|| format!("Failed to list {}", kind))?
                    .iter()
                    .map(row_to_item_mysql)
                    .collect()
            }
        };
        Ok(items)
    }

    async fn delete(&self, kind: CatalogKind, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to delete {} item", kind))?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to delete {} item", kind))?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}
