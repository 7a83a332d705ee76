//! Cache layer
//!
//! Process-local caching of hot listings (popular posts, popular tags),
//! backed by moka. Services invalidate by key prefix after writes.
//!
//! ```rust,ignore
//! let cache = create_cache(&config.cache);
//! cache.set(&keys::popular_posts(1, 10), &page).await?;
//! ```

pub mod memory;

use std::sync::Arc;
use std::time::Duration;

pub use memory::MemoryCache;

use crate::config::CacheConfig;

/// Create the shared cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    tracing::info!(
        "Using in-memory cache (capacity {}, ttl {}s)",
        config.max_capacity,
        config.ttl_seconds
    );
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

/// Cache key builders
pub mod keys {
    /// Pattern matching every cached post listing
    pub const POSTS_PATTERN: &str = "posts:*";
    /// Pattern matching every cached tag listing
    pub const TAGS_PATTERN: &str = "tags:*";

    pub fn popular_posts(page: u32, per_page: u32) -> String {
        format!("posts:popular:{}:{}", page, per_page)
    }

    pub fn popular_tags(limit: i64) -> String {
        format!("tags:popular:{}", limit)
    }
}
