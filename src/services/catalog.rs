//! Catalog service: services, process steps and audiences
//!
//! Both the public (active-only) and the admin list are cached per kind;
//! every admin write drops all cached lists of that kind.

use crate::cache::{keys, CacheLayer, MemoryCache};
use crate::db::repositories::CatalogRepository;
use crate::models::{CatalogItem, CatalogItemInput, CatalogKind};
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CatalogServiceError {
    #[error("{} not found", .0.label())]
    NotFound(CatalogKind),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
    cache: Arc<MemoryCache>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Active items ordered for display
    pub async fn list_public(&self, kind: CatalogKind) -> Result<Vec<CatalogItem>, CatalogServiceError> {
        self.cached_list(kind, true).await
    }

    /// Every item, including inactive ones
    pub async fn list_all(&self, kind: CatalogKind) -> Result<Vec<CatalogItem>, CatalogServiceError> {
        self.cached_list(kind, false).await
    }

    async fn cached_list(&self, kind: CatalogKind, active_only: bool) -> Result<Vec<CatalogItem>, CatalogServiceError> {
        let cache_key = keys::catalog(kind, active_only);
        if let Ok(Some(cached)) = self.cache.get::<Vec<CatalogItem>>(&cache_key).await {
            return Ok(cached);
        }

        let items = self
            .repo
            .list(kind, active_only)
            .await
            .with_context(|| format!("Failed to list {}", kind))?;
        if let Err(e) = self.cache.set_default(&cache_key, &items).await {
            tracing::warn!(error = %e, key = %cache_key, "Failed to cache catalog list");
        }
        Ok(items)
    }

    pub async fn create(&self, kind: CatalogKind, input: &CatalogItemInput) -> Result<CatalogItem, CatalogServiceError> {
        let item = self
            .repo
            .create(kind, input)
            .await
            .with_context(|| format!("Failed to create {} item", kind))?;
        self.invalidate(kind).await;
        Ok(item)
    }

    pub async fn update(
        &self,
        kind: CatalogKind,
        id: i64,
        input: &CatalogItemInput,
    ) -> Result<CatalogItem, CatalogServiceError> {
        let item = self
            .repo
            .update(kind, id, input)
            .await
            .with_context(|| format!("Failed to update {} item", kind))?
            .ok_or(CatalogServiceError::NotFound(kind))?;
        self.invalidate(kind).await;
        Ok(item)
    }

    pub async fn delete(&self, kind: CatalogKind, id: i64) -> Result<(), CatalogServiceError> {
        let deleted = self
            .repo
            .delete(kind, id)
            .await
            .with_context(|| format!("Failed to delete {} item", kind))?;
        if !deleted {
            return Err(CatalogServiceError::NotFound(kind));
        }
        self.invalidate(kind).await;
        Ok(())
    }

    async fn invalidate(&self, kind: CatalogKind) {
        if let Err(e) = self.cache.delete_pattern(&keys::catalog_pattern(kind)).await {
            tracing::warn!(error = %e, "Failed to invalidate {} cache", kind);
        }
    }
}
