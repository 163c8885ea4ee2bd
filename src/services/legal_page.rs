//! Legal page service (privacy policy, terms, imprint, ...)

use crate::db::repositories::LegalPageRepository;
use crate::models::{LegalPage, LegalPageInput};
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum LegalPageServiceError {
    #[error("Legal page not found")]
    NotFound,

    #[error("Legal page slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct LegalPageService {
    repo: Arc<dyn LegalPageRepository>,
}

impl LegalPageService {
    pub fn new(repo: Arc<dyn LegalPageRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<LegalPage>, LegalPageServiceError> {
        Ok(self.repo.list().await.context("Failed to list legal pages")?)
    }

    pub async fn get(&self, id: i64) -> Result<LegalPage, LegalPageServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get legal page")?
            .ok_or(LegalPageServiceError::NotFound)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<LegalPage, LegalPageServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get legal page")?
            .ok_or(LegalPageServiceError::NotFound)
    }

    pub async fn create(&self, input: &LegalPageInput) -> Result<LegalPage, LegalPageServiceError> {
        self.ensure_slug_free(&input.slug, None).await?;
        let page = self
            .repo
            .create(input)
            .await
            .context("Failed to create legal page")?;
        tracing::info!(slug = %page.slug, "Legal page created");
        Ok(page)
    }

    pub async fn update(&self, id: i64, input: &LegalPageInput) -> Result<LegalPage, LegalPageServiceError> {
        self.get(id).await?;
        self.ensure_slug_free(&input.slug, Some(id)).await?;
        self.repo
            .update(id, input)
            .await
            .context("Failed to update legal page")?
            .ok_or(LegalPageServiceError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), LegalPageServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete legal page")?;
        if !deleted {
            return Err(LegalPageServiceError::NotFound);
        }
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, exclude_id: Option<i64>) -> Result<(), LegalPageServiceError> {
        let taken = self
            .repo
            .slug_exists(slug, exclude_id)
            .await
            .context("Failed to check legal page slug")?;
        if taken {
            return Err(LegalPageServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxLegalPageRepository;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn setup_service() -> LegalPageService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        LegalPageService::new(SqlxLegalPageRepository::boxed(pool))
    }

    fn input(slug: &str) -> LegalPageInput {
        LegalPageInput {
            slug: slug.to_string(),
            title: "Privacy policy".to_string(),
            content: json!("<p>We keep little.</p>"),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let service = setup_service().await;
        let page = service.create(&input("privacy")).await.unwrap();
        assert_eq!(service.get_by_slug("privacy").await.unwrap().id, page.id);
        assert!(matches!(
            service.get_by_slug("terms").await,
            Err(LegalPageServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let service = setup_service().await;
        service.create(&input("privacy")).await.unwrap();
        let terms = service.create(&input("terms")).await.unwrap();

        assert!(matches!(
            service.create(&input("privacy")).await,
            Err(LegalPageServiceError::DuplicateSlug(_))
        ));
        assert!(matches!(
            service.update(terms.id, &input("privacy")).await,
            Err(LegalPageServiceError::DuplicateSlug(_))
        ));
        // Keeping its own slug is fine
        assert!(service.update(terms.id, &input("terms")).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_page() {
        let service = setup_service().await;
        assert!(matches!(
            service.update(42, &input("x")).await,
            Err(LegalPageServiceError::NotFound)
        ));
        assert!(matches!(service.delete(42).await, Err(LegalPageServiceError::NotFound)));
    }
}
