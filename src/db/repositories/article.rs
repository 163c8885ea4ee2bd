//! Article repository
//!
//! Database operations for articles and their ordered image lists.
//!
//! Deleting is soft: `soft_delete` stamps `deleted_at` and `restore` clears
//! it. Public reads only see rows with `is_draft = false` and a null
//! `deleted_at`.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Article, ArticleImage, ArticleImageInput, ArticleInput, ListParams, PublicArticleFilter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert an article with the given (already unique) slug, then its images
    async fn create(&self, slug: &str, input: &ArticleInput) -> Result<Article>;

    /// Overwrite every editable field and replace the image list.
    /// Returns `None` when no article has this id.
    async fn update(&self, id: i64, slug: &str, input: &ArticleInput) -> Result<Option<Article>>;

    /// Admin lookup; includes drafts and soft-deleted rows
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Public lookup; drafts and soft-deleted rows are invisible
    async fn get_public_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// Whether any article (including trashed ones) uses this slug
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Published articles, newest publish date first
    async fn list_public(&self, filter: &PublicArticleFilter) -> Result<Vec<Article>>;

    /// Admin listing of either live articles or the trash
    async fn list_admin(&self, deleted: bool, params: &ListParams) -> Result<(Vec<Article>, i64)>;

    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;

    async fn restore(&self, id: i64) -> Result<bool>;
}

pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, slug: &str, input: &ArticleInput) -> Result<Article> {
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let id = insert_article_sqlite(pool, slug, input).await?;
                replace_images_sqlite(pool, id, &input.images).await?;
                id
            }
            Backend::Mysql(pool) => {
                let id = insert_article_mysql(pool, slug, input).await?;
                replace_images_mysql(pool, id, &input.images).await?;
                id
            }
        };
        self.get_by_id(id)
            .await?
            .context("Article vanished right after insert")
    }

    async fn update(&self, id: i64, slug: &str, input: &ArticleInput) -> Result<Option<Article>> {
        let updated = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let updated = update_article_sqlite(pool, id, slug, input).await?;
                if updated {
                    replace_images_sqlite(pool, id, &input.images).await?;
                }
                updated
            }
            Backend::Mysql(pool) => {
                let updated = update_article_mysql(pool, id, slug, input).await?;
                if updated {
                    replace_images_mysql(pool, id, &input.images).await?;
                }
                updated
            }
        };
        if !updated {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get article by ID")?;
                let articles = row.iter().map(row_to_article_sqlite).collect::<Result<Vec<_>>>()?;
                Ok(attach_images_sqlite(pool, articles).await?.pop())
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get article by ID")?;
                let articles = row.iter().map(row_to_article_mysql).collect::<Result<Vec<_>>>()?;
                Ok(attach_images_mysql(pool, articles).await?.pop())
            }
        }
    }

    async fn get_public_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let sql = format!(
            "SELECT {} FROM articles WHERE slug = ? AND is_draft = ? AND deleted_at IS NULL",
            ARTICLE_COLUMNS
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .bind(false)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get article by slug")?;
                let articles = row.iter().map(row_to_article_sqlite).collect::<Result<Vec<_>>>()?;
                Ok(attach_images_sqlite(pool, articles).await?.pop())
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .bind(false)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get article by slug")?;
                let articles = row.iter().map(row_to_article_mysql).collect::<Result<Vec<_>>>()?;
                Ok(attach_images_mysql(pool, articles).await?.pop())
            }
        }
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let sql = "SELECT COUNT(*) AS total FROM articles WHERE slug = ? AND id <> ?";
        // Ids start at 1, so 0 never excludes anything
        let exclude_id = exclude_id.unwrap_or(0);
        let total: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .context("Failed to check article slug")?
                .get("total"),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .context("Failed to check article slug")?
                .get("total"),
        };
        Ok(total > 0)
    }

    async fn list_public(&self, filter: &PublicArticleFilter) -> Result<Vec<Article>> {
        let mut sql = format!(
            "SELECT {} FROM articles WHERE is_draft = ? AND deleted_at IS NULL",
            ARTICLE_COLUMNS
        );
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if filter.featured.is_some() {
            sql.push_str(" AND is_featured = ?");
        }
        sql.push_str(" ORDER BY COALESCE(publish_date, created_at) DESC, id DESC LIMIT ?");

        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut query = sqlx::query(&sql).bind(false);
                if let Some(category) = &filter.category {
                    query = query.bind(category);
                }
                if let Some(featured) = filter.featured {
                    query = query.bind(featured);
                }
                let rows = query
                    .bind(filter.limit)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list public articles")?;
                let articles = rows.iter().map(row_to_article_sqlite).collect::<Result<Vec<_>>>()?;
                attach_images_sqlite(pool, articles).await
            }
            Backend::Mysql(pool) => {
                let mut query = sqlx::query(&sql).bind(false);
                if let Some(category) = &filter.category {
                    query = query.bind(category);
                }
                if let Some(featured) = filter.featured {
                    query = query.bind(featured);
                }
                let rows = query
                    .bind(filter.limit)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list public articles")?;
                let articles = rows.iter().map(row_to_article_mysql).collect::<Result<Vec<_>>>()?;
                attach_images_mysql(pool, articles).await
            }
        }
    }

    async fn list_admin(&self, deleted: bool, params: &ListParams) -> Result<(Vec<Article>, i64)> {
        let condition = if deleted {
            "deleted_at IS NOT NULL"
        } else {
            "deleted_at IS NULL"
        };
        let count_sql = format!("SELECT COUNT(*) AS total FROM articles WHERE {}", condition);
        let list_sql = format!(
            "SELECT {} FROM articles WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            ARTICLE_COLUMNS, condition
        );

        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let total: i64 = sqlx::query(&count_sql)
                    .fetch_one(pool)
                    .await
                    .context("Failed to count articles")?
                    .get("total");
                let rows = sqlx::query(&list_sql)
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(pool)
                    .await
                    .context("Failed to list articles")?;
                let articles = rows.iter().map(row_to_article_sqlite).collect::<Result<Vec<_>>>()?;
                Ok((attach_images_sqlite(pool, articles).await?, total))
            }
            Backend::Mysql(pool) => {
                let total: i64 = sqlx::query(&count_sql)
                    .fetch_one(pool)
                    .await
                    .context("Failed to count articles")?
                    .get("total");
                let rows = sqlx::query(&list_sql)
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(pool)
                    .await
                    .context("Failed to list articles")?;
                let articles = rows.iter().map(row_to_article_mysql).collect::<Result<Vec<_>>>()?;
                Ok((attach_images_mysql(pool, articles).await?, total))
            }
        }
    }

    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let sql = "UPDATE articles SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(at)
                .bind(at)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete article")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(at)
                .bind(at)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete article")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn restore(&self, id: i64) -> Result<bool> {
        let sql = "UPDATE articles SET deleted_at = NULL, updated_at = ? WHERE id = ? AND deleted_at IS NOT NULL";
        let now = Utc::now();
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to restore article")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to restore article")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

const ARTICLE_COLUMNS: &str = "id, title, slug, body, is_draft, is_featured, category, \
     publish_date, deleted_at, created_at, updated_at";

const INSERT_ARTICLE: &str = r#"
    INSERT INTO articles
        (title, slug, body, is_draft, is_featured, category, publish_date, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_ARTICLE: &str = r#"
    UPDATE articles SET
        title = ?, slug = ?, body = ?, is_draft = ?, is_featured = ?,
        category = ?, publish_date = ?, updated_at = ?
    WHERE id = ?
"#;

fn image_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn group_images(articles: Vec<Article>, images: Vec<ArticleImage>) -> Vec<Article> {
    let mut by_article: HashMap<i64, Vec<ArticleImage>> = HashMap::new();
    for image in images {
        by_article.entry(image.article_id).or_default().push(image);
    }
    articles
        .into_iter()
        .map(|mut article| {
            article.images = by_article.remove(&article.id).unwrap_or_default();
            article
        })
        .collect()
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_article_sqlite(pool: &SqlitePool, slug: &str, input: &ArticleInput) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_ARTICLE)
        .bind(&input.title)
        .bind(slug)
        .bind(&input.body)
        .bind(input.is_draft)
        .bind(input.is_featured)
        .bind(&input.category)
        .bind(input.publish_date)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create article")?;
    Ok(result.last_insert_rowid())
}

async fn update_article_sqlite(
    pool: &SqlitePool,
    id: i64,
    slug: &str,
    input: &ArticleInput,
) -> Result<bool> {
    let result = sqlx::query(UPDATE_ARTICLE)
        .bind(&input.title)
        .bind(slug)
        .bind(&input.body)
        .bind(input.is_draft)
        .bind(input.is_featured)
        .bind(&input.category)
        .bind(input.publish_date)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update article")?;
    Ok(result.rows_affected() > 0)
}

async fn replace_images_sqlite(
    pool: &SqlitePool,
    article_id: i64,
    images: &[ArticleImageInput],
) -> Result<()> {
    sqlx::query("DELETE FROM article_images WHERE article_id = ?")
        .bind(article_id)
        .execute(pool)
        .await
        .context("Failed to clear article images")?;

    for (position, image) in images.iter().enumerate() {
        sqlx::query("INSERT INTO article_images (article_id, url, alt, position) VALUES (?, ?, ?, ?)")
            .bind(article_id)
            .bind(&image.url)
            .bind(&image.alt)
            .bind(position as i32)
            .execute(pool)
            .await
            .context("Failed to insert article image")?;
    }
    Ok(())
}

async fn attach_images_sqlite(pool: &SqlitePool, articles: Vec<Article>) -> Result<Vec<Article>> {
    if articles.is_empty() {
        return Ok(articles);
    }
    let sql = format!(
        "SELECT id, article_id, url, alt, position FROM article_images \
         WHERE article_id IN ({}) ORDER BY article_id, position, id",
        image_placeholders(articles.len())
    );
    let mut query = sqlx::query(&sql);
    for article in &articles {
        query = query.bind(article.id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load article images")?;

    let images = rows
        .iter()
        .map(|row| ArticleImage {
            id: row.get("id"),
            article_id: row.get("article_id"),
            url: row.get("url"),
            alt: row.get("alt"),
            position: row.get("position"),
        })
        .collect();
    Ok(group_images(articles, images))
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        body: row.get("body"),
        is_draft: row.get("is_draft"),
        is_featured: row.get("is_featured"),
        category: row.get("category"),
        publish_date: row.get("publish_date"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        images: Vec::new(),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_article_mysql(pool: &MySqlPool, slug: &str, input: &ArticleInput) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_ARTICLE)
        .bind(&input.title)
        .bind(slug)
        .bind(&input.body)
        .bind(input.is_draft)
        .bind(input.is_featured)
        .bind(&input.category)
        .bind(input.publish_date)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create article")?;
    Ok(result.last_insert_id() as i64)
}

async fn update_article_mysql(
    pool: &MySqlPool,
    id: i64,
    slug: &str,
    input: &ArticleInput,
) -> Result<bool> {
    let result = sqlx::query(UPDATE_ARTICLE)
        .bind(&input.title)
        .bind(slug)
        .bind(&input.body)
        .bind(input.is_draft)
        .bind(input.is_featured)
        .bind(&input.category)
        .bind(input.publish_date)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update article")?;
    Ok(result.rows_affected() > 0)
}

async fn replace_images_mysql(
    pool: &MySqlPool,
    article_id: i64,
    images: &[ArticleImageInput],
) -> Result<()> {
    sqlx::query("DELETE FROM article_images WHERE article_id = ?")
        .bind(article_id)
        .execute(pool)
        .await
        .context("Failed to clear article images")?;

    for (position, image) in images.iter().enumerate() {
        sqlx::query("INSERT INTO article_images (article_id, url, alt, position) VALUES (?, ?, ?, ?)")
            .bind(article_id)
            .bind(&image.url)
            .bind(&image.alt)
            .bind(position as i32)
            .execute(pool)
            .await
            .context("Failed to insert article image")?;
    }
    Ok(())
}

async fn attach_images_mysql(pool: &MySqlPool, articles: Vec<Article>) -> Result<Vec<Article>> {
    if articles.is_empty() {
        return Ok(articles);
    }
    let sql = format!(
        "SELECT id, article_id, url, alt, position FROM article_images \
         WHERE article_id IN ({}) ORDER BY article_id, position, id",
        image_placeholders(articles.len())
    );
    let mut query = sqlx::query(&sql);
    for article in &articles {
        query = query.bind(article.id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load article images")?;

    let images = rows
        .iter()
        .map(|row| ArticleImage {
            id: row.get("id"),
            article_id: row.get("article_id"),
            url: row.get("url"),
            alt: row.get("alt"),
            position: row.get("position"),
        })
        .collect();
    Ok(group_images(articles, images))
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        body: row.get("body"),
        is_draft: row.get("is_draft"),
        is_featured: row.get("is_featured"),
        category: row.get("category"),
        publish_date: row.get("publish_date"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        images: Vec::new(),
    })
}
