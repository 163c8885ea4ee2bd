//! Global settings repository
//!
//! The table holds at most one meaningful row: reads take the first row by
//! id and writes update that row, inserting it on first save.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{GlobalSettings, GlobalSettingsInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait GlobalSettingsRepository: Send + Sync {
    /// The stored settings, or `None` before the first save
    async fn get(&self) -> Result<Option<GlobalSettings>>;

    async fn save(&self, input: &GlobalSettingsInput) -> Result<GlobalSettings>;
}

pub struct SqlxGlobalSettingsRepository {
    pool: DynDatabasePool,
}

impl SqlxGlobalSettingsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn GlobalSettingsRepository> {
        Arc::new(Self::new(pool))
    }

    async fn first_id(&self) -> Result<Option<i64>> {
        let sql = "SELECT id FROM global_settings ORDER BY id ASC LIMIT 1";
        let id: Option<i64> = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .fetch_optional(pool)
                .await
                .context("Failed to read settings row")?
                .map(|row| row.get("id")),
            Backend::Mysql(pool) => sqlx::query(sql)
                .fetch_optional(pool)
                .await
                .context("Failed to read settings row")?
                .map(|row| row.get("id")),
        };
        Ok(id)
    }
}

const SETTINGS_COLUMNS: &str = "site_name, contact_email, contact_phone, address, \
     linkedin_url, instagram_url, facebook_url, twitter_url, updated_at";

fn row_to_settings_sqlite(row: &sqlx::sqlite::SqliteRow) -> GlobalSettings {
    GlobalSettings {
        site_name: row.get("site_name"),
        contact_email: row.get("contact_email"),
        contact_phone: row.get("contact_phone"),
        address: row.get("address"),
        linkedin_url: row.get("linkedin_url"),
        instagram_url: row.get("instagram_url"),
        facebook_url: row.get("facebook_url"),
        twitter_url: row.get("twitter_url"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_settings_mysql(row: &sqlx::mysql::MySqlRow) -> GlobalSettings {
    GlobalSettings {
        site_name: row.get("site_name"),
        contact_email: row.get("contact_email"),
        contact_phone: row.get("contact_phone"),
        address: row.get("address"),
        linkedin_url: row.get("linkedin_url"),
        instagram_url: row.get("instagram_url"),
        facebook_url: row.get("facebook_url"),
        twitter_url: row.get("twitter_url"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl GlobalSettingsRepository for SqlxGlobalSettingsRepository {
    async fn get(&self) -> Result<Option<GlobalSettings>> {
        let sql = format!(
            "SELECT {} FROM global_settings ORDER BY id ASC LIMIT 1",
            SETTINGS_COLUMNS
        );
        let settings = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .fetch_optional(pool)
                .await
                .context("Failed to get global settings")?
                .as_ref()
                .map(row_to_settings_sqlite),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .fetch_optional(pool)
                .await
                .context("Failed to get global settings")?
                .as_ref()
                .map(row_to_settings_mysql),
        };
        Ok(settings)
    }

    async fn save(&self, input: &GlobalSettingsInput) -> Result<GlobalSettings> {
        let now = Utc::now();
        let existing = self.first_id().await?;

        let sql = match existing {
            Some(_) => {
                "UPDATE global_settings SET site_name = ?, contact_email = ?, contact_phone = ?, \
                 address = ?, linkedin_url = ?, instagram_url = ?, facebook_url = ?, twitter_url = ?, \
                 updated_at = ? WHERE id = ?"
            }
            None => {
                "INSERT INTO global_settings (site_name, contact_email, contact_phone, address, \
                 linkedin_url, instagram_url, facebook_url, twitter_url, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
            }
        };

        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut query = sqlx::query(sql)
                    .bind(&input.site_name)
                    .bind(&input.contact_email)
                    .bind(&input.contact_phone)
                    .bind(&input.address)
                    .bind(&input.linkedin_url)
                    .bind(&input.instagram_url)
                    .bind(&input.facebook_url)
                    .bind(&input.twitter_url)
                    .bind(now);
                if let Some(id) = existing {
                    query = query.bind(id);
                }
                query
                    .execute(pool)
                    .await
                    .context("Failed to save global settings")?;
            }
            Backend::Mysql(pool) => {
                let mut query = sqlx::query(sql)
                    .bind(&input.site_name)
                    .bind(&input.contact_email)
                    .bind(&input.contact_phone)
                    .bind(&input.address)
                    .bind(&input.linkedin_url)
                    .bind(&input.instagram_url)
                    .bind(&input.facebook_url)
                    .bind(&input.twitter_url)
                    .bind(now);
                if let Some(id) = existing {
                    query = query.bind(id);
                }
                query
                    .execute(pool)
                    .await
                    .context("Failed to save global settings")?;
            }
        }

        Ok(GlobalSettings {
            site_name: input.site_name.clone(),
            contact_email: input.contact_email.clone(),
            contact_phone: input.contact_phone.clone(),
            address: input.address.clone(),
            linkedin_url: input.linkedin_url.clone(),
            instagram_url: input.instagram_url.clone(),
            facebook_url: input.facebook_url.clone(),
            twitter_url: input.twitter_url.clone(),
            updated_at: Some(now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxGlobalSettingsRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxGlobalSettingsRepository::new(pool)
    }

    fn input(site_name: &str) -> GlobalSettingsInput {
        GlobalSettingsInput {
            site_name: site_name.to_string(),
            contact_email: Some("hello@acme.test".into()),
            contact_phone: None,
            address: Some("1 Main St".into()),
            linkedin_url: None,
            instagram_url: None,
            facebook_url: None,
            twitter_url: Some("https://twitter.com/acme".into()),
        }
    }

    #[tokio::test]
    async fn test_empty_table_returns_none() {
        let repo = setup_test_repo().await;
        assert!(repo.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_inserts_then_updates_single_row() {
        let repo = setup_test_repo().await;
        repo.save(&input("Acme")).await.unwrap();
        repo.save(&input("Acme Studio")).await.unwrap();

        let settings = repo.get().await.unwrap().expect("Settings should exist");
        assert_eq!(settings.site_name, "Acme Studio");
        assert_eq!(settings.contact_email.as_deref(), Some("hello@acme.test"));
        assert!(settings.updated_at.is_some());

        let pool = repo.pool.as_sqlite().unwrap();
        let count: i64 = sqlx::query("SELECT COUNT(*) AS total FROM global_settings")
            .fetch_one(pool)
            .await
            .unwrap()
            .get("total");
        assert_eq!(count, 1);
    }
}
