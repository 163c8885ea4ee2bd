//! Global settings service
//!
//! Serves the stored settings row, falling back to [`GlobalSettings::default`]
//! while nothing has been saved. Reads go through the cache.

use std::sync::Arc;
use thiserror::Error;

use crate::cache::{keys, CacheLayer, MemoryCache};
use crate::db::repositories::GlobalSettingsRepository;
use crate::models::{GlobalSettings, GlobalSettingsInput};

#[derive(Debug, Error)]
pub enum SettingsServiceError {
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    #[error("Failed to save settings: {0}")]
    SaveError(String),
}

pub struct SettingsService {
    repo: Arc<dyn GlobalSettingsRepository>,
    cache: Arc<MemoryCache>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn GlobalSettingsRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn get(&self) -> Result<GlobalSettings, SettingsServiceError> {
        if let Ok(Some(cached)) = self.cache.get::<GlobalSettings>(keys::GLOBAL_SETTINGS).await {
            return Ok(cached);
        }

        let settings = self
            .repo
            .get()
            .await
            .map_err(|e| SettingsServiceError::LoadError(format!("{:#}", e)))?
            .unwrap_or_default();

        if let Err(e) = self.cache.set_default(keys::GLOBAL_SETTINGS, &settings).await {
            tracing::warn!(error = %e, "Failed to cache global settings");
        }
        Ok(settings)
    }

    pub async fn update(&self, input: &GlobalSettingsInput) -> Result<GlobalSettings, SettingsServiceError> {
        let settings = self
            .repo
            .save(input)
            .await
            .map_err(|e| SettingsServiceError::SaveError(format!("{:#}", e)))?;

        if let Err(e) = self.cache.delete(keys::GLOBAL_SETTINGS).await {
            tracing::warn!(error = %e, "Failed to invalidate global settings cache");
        }
        tracing::info!("Global settings updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxGlobalSettingsRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::DEFAULT_SITE_NAME;

    async fn setup_service() -> SettingsService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SettingsService::new(
            SqlxGlobalSettingsRepository::boxed(pool),
            Arc::new(MemoryCache::new()),
        )
    }

    #[tokio::test]
    async fn test_defaults_without_row() {
        let service = setup_service().await;
        let settings = service.get().await.unwrap();
        assert_eq!(settings, GlobalSettings::default());
        assert_eq!(settings.site_name, DEFAULT_SITE_NAME);
    }

    #[tokio::test]
    async fn test_update_replaces_cached_defaults() {
        let service = setup_service().await;
        service.get().await.unwrap();

        let input = GlobalSettingsInput {
            site_name: "Acme".into(),
            contact_email: Some("hello@acme.test".into()),
            contact_phone: None,
            address: None,
            linkedin_url: None,
            instagram_url: Some("https://instagram.com/acme".into()),
            facebook_url: None,
            twitter_url: None,
        };
        service.update(&input).await.unwrap();

        let settings = service.get().await.unwrap();
        assert_eq!(settings.site_name, "Acme");
        assert_eq!(settings.instagram_url.as_deref(), Some("https://instagram.com/acme"));
    }
}
