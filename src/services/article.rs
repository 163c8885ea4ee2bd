//! Article service
//!
//! Slug handling and the public/admin split on top of the article
//! repository. Deleting an article moves it to the trash (soft delete);
//! restoring brings it back.

use crate::db::repositories::ArticleRepository;
use crate::models::{Article, ArticleInput, ListParams, PagedResult, PublicArticleFilter};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Longest slug accepted by the validation rules
pub const MAX_SLUG_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    #[error("Article not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Article slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticleRepository>) -> Self {
        Self { repo }
    }

    /// Non-draft, non-deleted articles, newest first
    pub async fn list_public(&self, filter: &PublicArticleFilter) -> Result<Vec<Article>, ArticleServiceError> {
        let articles = self
            .repo
            .list_public(filter)
            .await
            .context("Failed to list public articles")?;
        Ok(articles)
    }

    pub async fn get_public_by_slug(&self, slug: &str) -> Result<Article, ArticleServiceError> {
        self.repo
            .get_public_by_slug(slug)
            .await
            .context("Failed to get article by slug")?
            .ok_or(ArticleServiceError::NotFound)
    }

    /// Admin listing; `deleted` switches to the trash
    pub async fn list_admin(
        &self,
        deleted: bool,
        params: &ListParams,
    ) -> Result<PagedResult<Article>, ArticleServiceError> {
        let (items, total) = self
            .repo
            .list_admin(deleted, params)
            .await
            .context("Failed to list articles")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?
            .ok_or(ArticleServiceError::NotFound)
    }

    pub async fn create(&self, input: &ArticleInput) -> Result<Article, ArticleServiceError> {
        let slug = match &input.slug {
            Some(slug) => slug.clone(),
            None => generate_slug(&input.title),
        };
        if slug.is_empty() {
            return Err(ArticleServiceError::Validation(
                "Cannot derive a slug from the title; provide one".to_string(),
            ));
        }
        self.ensure_slug_free(&slug, None).await?;

        let article = self
            .repo
            .create(&slug, input)
            .await
            .context("Failed to create article")?;
        tracing::info!(article_id = article.id, slug = %article.slug, "Article created");
        Ok(article)
    }

    /// Replace an article. Without a slug in `input` the current one is kept.
    pub async fn update(&self, id: i64, input: &ArticleInput) -> Result<Article, ArticleServiceError> {
        let existing = self.get(id).await?;
        let slug = input.slug.clone().unwrap_or(existing.slug);
        self.ensure_slug_free(&slug, Some(id)).await?;

        self.repo
            .update(id, &slug, input)
            .await
            .context("Failed to update article")?
            .ok_or(ArticleServiceError::NotFound)
    }

    /// Move an article to the trash
    pub async fn delete(&self, id: i64) -> Result<(), ArticleServiceError> {
        let deleted = self
            .repo
            .soft_delete(id, Utc::now())
            .await
            .context("Failed to delete article")?;
        if !deleted {
            return Err(ArticleServiceError::NotFound);
        }
        tracing::info!(article_id = id, "Article moved to trash");
        Ok(())
    }

    /// Take an article out of the trash. Restoring a live article is a no-op.
    pub async fn restore(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.repo
            .restore(id)
            .await
            .context("Failed to restore article")?;
        self.get(id).await
    }

    async fn ensure_slug_free(&self, slug: &str, exclude_id: Option<i64>) -> Result<(), ArticleServiceError> {
        let taken = self
            .repo
            .slug_exists(slug, exclude_id)
            .await
            .context("Failed to check article slug")?;
        if taken {
            return Err(ArticleServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }
}

/// Derive a URL slug from a title.
///
/// Lowercases, folds common Latin accents to ASCII, turns every other run of
/// characters into a single hyphen and caps the length at [`MAX_SLUG_LEN`].
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        match fold_ascii(c) {
            Some(c) => {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c);
            }
            None => pending_hyphen = true,
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

fn fold_ascii(c: char) -> Option<char> {
    let folded = match c {
        'a'..='z' | '0'..='9' => c,
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}
