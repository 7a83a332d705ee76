//! In-memory cache implementation using moka
//!
//! Values are stored as JSON so any serializable type can be cached.
//! Entries expire after the configured time-to-live; keys can be removed
//! one by one or in bulk with a glob pattern.

use anyhow::{Context, Result};
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Default TTL for cache entries
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// JSON-serialized cache value
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache with default settings
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a new memory cache with custom capacity and time-to-live
    pub fn with_capacity_and_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache, ttl }
    }

    /// Time-to-live of every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the current number of entries in the cache
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Get a value. Expired and missing keys both yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Set a value, overwriting any previous one
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry::new(value)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    /// Delete a value. Missing keys are ignored.
    pub async fn delete(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Delete all keys matching a glob pattern (`*` and `?`)
    pub async fn delete_pattern(&self, pattern: &str) {
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| pattern_matches(pattern, key.as_str()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys {
            self.cache.invalidate(&key).await;
        }
    }

    /// Clear all cache entries
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Glob match: `*` matches any sequence, `?` any single character.
fn pattern_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut pi, mut ki) = (0, 0);
    // Position of the last `*` and the key index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while ki < key.len() {
        match pattern.get(pi) {
            Some('*') => {
                backtrack = Some((pi, ki));
                pi += 1;
            }
            Some(&c) if c == '?' || c == key[ki] => {
                pi += 1;
                ki += 1;
            }
            _ => match backtrack {
                Some((star, star_ki)) => {
                    pi = star + 1;
                    ki = star_ki + 1;
                    backtrack = Some((star, star_ki + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();

        cache.set("key", &"value").await.unwrap();
        let value: Option<String> = cache.get("key").await.unwrap();

        assert_eq!(value, Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new();
        let value: Option<String> = cache.get("missing").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache.set("key", &1).await.unwrap();

        cache.delete("key").await;

        assert!(cache.get::<i32>("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = MemoryCache::new();
        cache.set("posts:popular:1", &1).await.unwrap();
        cache.set("posts:popular:2", &2).await.unwrap();
        cache.set("tags:popular", &3).await.unwrap();

        cache.delete_pattern("posts:*").await;

        assert!(cache.get::<i32>("posts:popular:1").await.unwrap().is_none());
        assert!(cache.get::<i32>("posts:popular:2").await.unwrap().is_none());
        assert_eq!(cache.get::<i32>("tags:popular").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new();
        cache.set("a", &1).await.unwrap();
        cache.set("b", &2).await.unwrap();

        cache.clear().await;

        assert!(cache.get::<i32>("a").await.unwrap().is_none());
        assert!(cache.get::<i32>("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MemoryCache::with_capacity_and_ttl(100, Duration::from_millis(50));
        cache.set("short", &"lived").await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get::<String>("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complex_types() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Entry {
            slug: String,
            likes: i64,
        }

        let cache = MemoryCache::new();
        let entries = vec![Entry { slug: "a".into(), likes: 2 }];
        cache.set("entries", &entries).await.unwrap();

        let cached: Option<Vec<Entry>> = cache.get("entries").await.unwrap();
        assert_eq!(cached, Some(entries));
    }

    #[tokio::test]
    async fn test_wrong_type_is_an_error() {
        let cache = MemoryCache::new();
        cache.set("key", &"text").await.unwrap();
        assert!(cache.get::<i64>("key").await.is_err());
    }

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("posts:*", "posts:popular:1"));
        assert!(pattern_matches("*", ""));
        assert!(pattern_matches("user:?:name", "user:1:name"));
        assert!(pattern_matches("a*b*c", "axxbyyc"));
        assert!(!pattern_matches("user:?:name", "user:12:name"));
        assert!(!pattern_matches("posts:*", "tags:1"));
        assert!(!pattern_matches("abc", "ab"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn property_literal_pattern_matches_itself(key in "[a-z:0-9]{0,20}") {
            prop_assert!(pattern_matches(&key, &key));
            let prefix_pattern = format!("{}*", key);
            let extended = format!("{}suffix", key);
            prop_assert!(pattern_matches(&prefix_pattern, &extended));
        }
    }
}
