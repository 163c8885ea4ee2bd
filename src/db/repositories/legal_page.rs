//! Legal page repository
//!
//! `content` is persisted as serialized JSON text and parsed back on read.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{LegalPage, LegalPageInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait LegalPageRepository: Send + Sync {
    async fn create(&self, input: &LegalPageInput) -> Result<LegalPage>;

    async fn update(&self, id: i64, input: &LegalPageInput) -> Result<Option<LegalPage>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<LegalPage>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<LegalPage>>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// All pages ordered by slug
    async fn list(&self) -> Result<Vec<LegalPage>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxLegalPageRepository {
    pool: DynDatabasePool,
}

impl SqlxLegalPageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LegalPageRepository> {
        Arc::new(Self::new(pool))
    }
}

const PAGE_COLUMNS: &str = "id, slug, title, content, created_at, updated_at";

/// Maps a row of either backend; both expose the same column types
macro_rules! row_to_legal_page {
    ($row:expr) => {{
        let row = $row;
        let content: String = row.get("content");
        Ok::<_, anyhow::Error>(LegalPage {
            id: row.get("id"),
            slug: row.get("slug"),
            title: row.get("title"),
            content: serde_json::from_str(&content).context("Stored legal page content is not JSON")?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }};
}

#[async_trait]
impl LegalPageRepository for SqlxLegalPageRepository {
    async fn create(&self, input: &LegalPageInput) -> Result<LegalPage> {
        let sql = "INSERT INTO legal_pages (slug, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)";
        let content = serde_json::to_string(&input.content)?;
        let now = Utc::now();
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(&input.slug)
                .bind(&input.title)
                .bind(&content)
                .bind(now)
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to create legal page")?
                .last_insert_rowid(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(&input.slug)
                .bind(&input.title)
                .bind(&content)
                .bind(now)
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to create legal page")?
                .last_insert_id() as i64,
        };

        Ok(LegalPage {
            id,
            slug: input.slug.clone(),
            title: input.title.clone(),
            content: input.content.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, id: i64, input: &LegalPageInput) -> Result<Option<LegalPage>> {
        let sql = "UPDATE legal_pages SET slug = ?, title = ?, content = ?, updated_at = ? WHERE id = ?";
        let content = serde_json::to_string(&input.content)?;
        let now = Utc::now();
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(&input.slug)
                .bind(&input.title)
                .bind(&content)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update legal page")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(&input.slug)
                .bind(&input.title)
                .bind(&content)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update legal page")?
                .rows_affected(),
        };
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<LegalPage>> {
        let sql = format!("SELECT {} FROM legal_pages WHERE id = ?", PAGE_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("Failed to get legal page by ID")?
                .map(|row| row_to_legal_page!(row))
                .transpose(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("Failed to get legal page by ID")?
                .map(|row| row_to_legal_page!(row))
                .transpose(),
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<LegalPage>> {
        let sql = format!("SELECT {} FROM legal_pages WHERE slug = ?", PAGE_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(slug)
                .fetch_optional(pool)
                .await
                .context("Failed to get legal page by slug")?
                .map(|row| row_to_legal_page!(row))
                .transpose(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(slug)
                .fetch_optional(pool)
                .await
                .context("Failed to get legal page by slug")?
                .map(|row| row_to_legal_page!(row))
                .transpose(),
        }
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let sql = "SELECT COUNT(*) AS total FROM legal_pages WHERE slug = ? AND id <> ?";
        let exclude_id = exclude_id.unwrap_or(0);
        let total: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .context("Failed to check legal page slug")?
                .get("total"),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .context("Failed to check legal page slug")?
                .get("total"),
        };
        Ok(total > 0)
    }

    async fn list(&self) -> Result<Vec<LegalPage>> {
        let sql = format!("SELECT {} FROM legal_pages ORDER BY slug", PAGE_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .fetch_all(pool)
                .await
                .context("Failed to list legal pages")?
                .iter()
                .map(|row| row_to_legal_page!(row))
                .collect(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .fetch_all(pool)
                .await
                .context("Failed to list legal pages")?
                .iter()
                .map(|row| row_to_legal_page!(row))
                .collect(),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM legal_pages WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete legal page")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete legal page")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn setup_test_repo() -> SqlxLegalPageRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxLegalPageRepository::new(pool)
    }

    fn input(slug: &str, content: serde_json::Value) -> LegalPageInput {
        LegalPageInput {
            slug: slug.to_string(),
            title: format!("Title {}", slug),
            content,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_keeps_json_content() {
        let repo = setup_test_repo().await;
        let blocks = json!([{"type": "heading", "children": [{"text": "Privacy"}]}]);

        let created = repo.create(&input("privacy", blocks.clone())).await.unwrap();
        let by_slug = repo.get_by_slug("privacy").await.unwrap().expect("Page not found");
        assert_eq!(by_slug.id, created.id);
        assert_eq!(by_slug.content, blocks);

        let html = repo.create(&input("imprint", json!("<p>Acme Ltd.</p>"))).await.unwrap();
        let by_id = repo.get_by_id(html.id).await.unwrap().unwrap();
        assert_eq!(by_id.content, json!("<p>Acme Ltd.</p>"));
    }

    #[tokio::test]
    async fn test_update_list_delete() {
        let repo = setup_test_repo().await;
        let page = repo.create(&input("terms", json!("v1"))).await.unwrap();
        repo.create(&input("cookies", json!("c"))).await.unwrap();

        let updated = repo
            .update(page.id, &input("terms", json!("v2")))
            .await
            .unwrap()
            .expect("Page should exist");
        assert_eq!(updated.content, json!("v2"));
        assert!(repo.update(999, &input("x", json!("x"))).await.unwrap().is_none());

        let slugs: Vec<_> = repo.list().await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["cookies", "terms"]);

        assert!(repo.delete(page.id).await.unwrap());
        assert!(!repo.delete(page.id).await.unwrap());
        assert!(repo.get_by_slug("terms").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_slug_exists() {
        let repo = setup_test_repo().await;
        let page = repo.create(&input("privacy", json!("x"))).await.unwrap();
        assert!(repo.slug_exists("privacy", None).await.unwrap());
        assert!(!repo.slug_exists("privacy", Some(page.id)).await.unwrap());
        assert!(!repo.slug_exists("other", None).await.unwrap());
    }
}
