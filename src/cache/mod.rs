//! Cache layer
//!
//! In-process cache for the public read paths that change rarely (global
//! settings, catalog lists). Admin writes invalidate the matching keys.
//!
//! ```rust,ignore
//! use vitrine::cache::{create_cache, CacheLayer};
//!
//! let cache = create_cache(&config.cache);
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::models::CatalogKind;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// The generic methods make this trait unusable as `dyn CacheLayer`; share
/// the concrete [`MemoryCache`] behind an `Arc` instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every key matching a glob pattern (`*`, `?`)
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}

/// Cache keys used by the services
pub mod keys {
    use super::CatalogKind;

    pub const GLOBAL_SETTINGS: &str = "settings:global";

    /// Key of a catalog list; `active_only` is the public list
    pub fn catalog(kind: CatalogKind, active_only: bool) -> String {
        let scope = if active_only { "active" } else { "all" };
        format!("catalog:{}:{}", kind.table(), scope)
    }

    /// Pattern covering every cached list of one kind
    pub fn catalog_pattern(kind: CatalogKind) -> String {
        format!("catalog:{}:*", kind.table())
    }
}

pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(MemoryCache::with_capacity_and_ttl(1_000, ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_uses_configured_ttl() {
        let config = CacheConfig { ttl_seconds: 1800 };
        let cache = create_cache(&config);
        assert_eq!(cache.default_ttl(), Duration::from_secs(1800));

        cache.set("key", &"value".to_string(), Duration::from_secs(60)).await.unwrap();
        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
    }

    #[test]
    fn test_catalog_keys() {
        assert_eq!(keys::catalog(CatalogKind::Step, true), "catalog:steps:active");
        assert_eq!(keys::catalog(CatalogKind::Step, false), "catalog:steps:all");
        assert_eq!(keys::catalog_pattern(CatalogKind::Audience), "catalog:audiences:*");
    }

    #[tokio::test]
    async fn test_catalog_pattern_spares_other_kinds() {
        let cache = MemoryCache::new();
        for kind in CatalogKind::ALL {
            cache.set_default(&keys::catalog(kind, true), &kind.table()).await.unwrap();
            cache.set_default(&keys::catalog(kind, false), &kind.table()).await.unwrap();
        }

        cache.delete_pattern(&keys::catalog_pattern(CatalogKind::Step)).await.unwrap();

        for kind in CatalogKind::ALL {
            let cached: Option<String> = cache.get(&keys::catalog(kind, false)).await.unwrap();
            assert_eq!(cached.is_some(), kind != CatalogKind::Step, "{}", kind.table());
        }
    }
}
