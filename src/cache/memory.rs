//! In-memory cache implementation using moka
//!
//! Values are stored as JSON text so any serializable type fits. Each entry
//! carries its own TTL through a moka [`Expiry`] policy.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_MAX_CAPACITY: u64 = 1_000;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
    ttl: Duration,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
            ttl,
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &CacheEntry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache using moka
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a cache holding at most `max_capacity` entries, where
    /// `default_ttl` applies to [`MemoryCache::set_default`]
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self { cache, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store a value with the configured default TTL
    pub async fn set_default<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, value, self.default_ttl).await
    }

    /// Glob-style match: `*` is any run of characters, `?` exactly one
    ///
    /// - `catalog:*` matches `catalog:services`
    /// - `catalog:?teps` matches `catalog:steps`
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern: Vec<char> = pattern.chars().collect();
        let key: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern, &key)
    }

    fn glob_match(pattern: &[char], key: &[char]) -> bool {
        match pattern.split_first() {
            None => key.is_empty(),
            Some(('*', rest)) => {
                Self::glob_match(rest, key) || (!key.is_empty() && Self::glob_match(pattern, &key[1..]))
            }
            Some(('?', rest)) => !key.is_empty() && Self::glob_match(rest, &key[1..]),
            Some((c, rest)) => key.first() == Some(c) && Self::glob_match(rest, &key[1..]),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(value, ttl)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        // moka's iter() yields (Arc<K>, V)
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys {
            self.cache.invalidate(&key).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache.set("key1", &"value1".to_string(), Duration::from_secs(60)).await.unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new();
        let result: Option<String> = cache.get("nonexistent").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = MemoryCache::new();
        cache.set("short", &1u32, Duration::from_millis(10)).await.unwrap();
        cache.set("long", &2u32, Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.cache.run_pending_tasks().await;

        assert_eq!(cache.get::<u32>("short").await.unwrap(), None);
        assert_eq!(cache.get::<u32>("long").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache.set_default("key1", &"value1").await.unwrap();
        cache.delete("key1").await.unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = MemoryCache::new();
        cache.set_default("catalog:services", &vec![1, 2]).await.unwrap();
        cache.set_default("catalog:steps", &vec![3]).await.unwrap();
        cache.set_default("settings:global", &"acme").await.unwrap();

        cache.delete_pattern("catalog:*").await.unwrap();

        assert_eq!(cache.get::<Vec<i32>>("catalog:services").await.unwrap(), None);
        assert_eq!(cache.get::<Vec<i32>>("catalog:steps").await.unwrap(), None);
        assert_eq!(
            cache.get::<String>("settings:global").await.unwrap(),
            Some("acme".to_string())
        );
    }

    #[test]
    fn test_pattern_matches() {
        assert!(MemoryCache::pattern_matches("catalog:*", "catalog:services"));
        assert!(MemoryCache::pattern_matches("catalog:*", "catalog:"));
        assert!(MemoryCache::pattern_matches("catalog:?teps", "catalog:steps"));
        assert!(MemoryCache::pattern_matches("*", "anything"));
        assert!(!MemoryCache::pattern_matches("catalog:*", "settings:global"));
        assert!(!MemoryCache::pattern_matches("catalog:?", "catalog:steps"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            #[test]
            fn prefix_pattern_matches_every_suffix(prefix in "[a-z]{1,8}", suffix in "[a-z:]{0,12}") {
                let pattern = format!("{}:*", prefix);
                let key = format!("{}:{}", prefix, suffix);
                prop_assert!(MemoryCache::pattern_matches(&pattern, &key));
            }

            #[test]
            fn literal_pattern_matches_only_itself(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
                prop_assert_eq!(MemoryCache::pattern_matches(&a, &b), a == b);
            }
        }
    }
}
