//! Tag service
//!
//! Titles are normalized (trimmed, lowercased) before validation, so
//! "Rust" and "rust " name the same tag and cannot both exist.

use crate::cache::{keys, MemoryCache};
use crate::db::repositories::{is_unique_violation, TagRepository};
use crate::models::{Tag, TagWithCount, TAG_TITLE_MAX_LEN};
use anyhow::Context;
use std::sync::Arc;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    #[error("Tag not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Tag already exists: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
    cache: Arc<MemoryCache>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Normalize and validate a title
    pub fn clean_title(title: &str) -> Result<String, TagServiceError> {
        let title = Tag::normalize_title(title);
        if title.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag title cannot be empty".to_string(),
            ));
        }
        if title.chars().count() > TAG_TITLE_MAX_LEN {
            return Err(TagServiceError::ValidationError(format!(
                "Tag title must be at most {} characters",
                TAG_TITLE_MAX_LEN
            )));
        }
        Ok(title)
    }

    /// Create a tag. Duplicate titles (after normalization) are rejected.
    pub async fn create(&self, title: &str) -> Result<Tag, TagServiceError> {
        let title = Self::clean_title(title)?;

        if self
            .repo
            .get_by_title(&title)
            .await
            .context("Failed to check existing tag")?
            .is_some()
        {
            return Err(TagServiceError::Conflict(title));
        }

        let tag = match self.repo.create(&title).await {
            Ok(tag) => tag,
            Err(e) if is_unique_violation(&e) => return Err(TagServiceError::Conflict(title)),
            Err(e) => return Err(e.context("Failed to create tag").into()),
        };
        tracing::info!("Created tag {} ({})", tag.title, tag.id);
        self.invalidate().await;
        Ok(tag)
    }

    /// Rename a tag
    pub async fn update(&self, id: i64, title: &str) -> Result<Tag, TagServiceError> {
        let title = Self::clean_title(title)?;

        if let Some(existing) = self
            .repo
            .get_by_title(&title)
            .await
            .context("Failed to check existing tag")?
        {
            if existing.id != id {
                return Err(TagServiceError::Conflict(title));
            }
        }

        let tag = match self.repo.update(id, &title).await {
            Ok(tag) => tag.ok_or_else(|| TagServiceError::NotFound(id.to_string()))?,
            Err(e) if is_unique_violation(&e) => return Err(TagServiceError::Conflict(title)),
            Err(e) => return Err(e.context("Failed to update tag").into()),
        };
        self.invalidate().await;
        Ok(tag)
    }

    /// Delete a tag. Posts keep their other tags.
    pub async fn delete(&self, id: i64) -> Result<(), TagServiceError> {
        let deleted = self.repo.delete(id).await.context("Failed to delete tag")?;
        if !deleted {
            return Err(TagServiceError::NotFound(id.to_string()));
        }
        tracing::info!("Deleted tag {}", id);
        self.invalidate().await;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag by ID")
            .map_err(Into::into)
    }

    /// Look a tag up by title; the title is normalized first
    pub async fn get_by_title(&self, title: &str) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_title(&Tag::normalize_title(title))
            .await
            .context("Failed to get tag by title")
            .map_err(Into::into)
    }

    /// All tags ordered by title
    pub async fn list(&self) -> Result<Vec<TagWithCount>, TagServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list tags")
            .map_err(Into::into)
    }

    pub async fn count(&self) -> Result<i64, TagServiceError> {
        self.repo
            .count()
            .await
            .context("Failed to count tags")
            .map_err(Into::into)
    }

    /// Tags by post count descending, then title. Cached.
    pub async fn popular(&self, limit: i64) -> Result<Vec<TagWithCount>, TagServiceError> {
        let limit = limit.clamp(1, 100);
        let key = keys::popular_tags(limit);

        match self.cache.get::<Vec<TagWithCount>>(&key).await {
            Ok(Some(tags)) => return Ok(tags),
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring unreadable cache entry {}: {}", key, e),
        }

        let tags = self
            .repo
            .popular(limit)
            .await
            .context("Failed to get popular tags")?;

        if let Err(e) = self.cache.set(&key, &tags).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        Ok(tags)
    }

    /// Drop cached tag listings
    pub async fn invalidate(&self) {
        self.cache.delete_pattern(keys::TAGS_PATTERN).await;
        self.cache.delete_pattern(keys::POSTS_PATTERN).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;

    async fn setup() -> TagService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        TagService::new(SqlxTagRepository::boxed(pool), Arc::new(MemoryCache::new()))
    }

    #[tokio::test]
    async fn test_create_normalizes_title() {
        let service = setup().await;

        let tag = service.create("  Rust ").await.expect("Failed to create tag");

        assert_eq!(tag.title, "rust");
        assert_eq!(tag.absolute_url(), "/tag/rust");
    }

    #[tokio::test]
    async fn test_create_rejects_case_insensitive_duplicates() {
        let service = setup().await;
        service.create("rust").await.unwrap();

        let result = service.create("RUST").await;

        assert!(matches!(result, Err(TagServiceError::Conflict(t)) if t == "rust"));
    }

    #[tokio::test]
    async fn test_create_validates_length() {
        let service = setup().await;

        assert!(matches!(
            service.create("   ").await,
            Err(TagServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.create(&"x".repeat(21)).await,
            Err(TagServiceError::ValidationError(_))
        ));
        assert!(service.create(&"x".repeat(20)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_conflicts() {
        let service = setup().await;
        let rust = service.create("rust").await.unwrap();
        service.create("web").await.unwrap();

        let renamed = service.update(rust.id, "Rustlang").await.unwrap();
        assert_eq!(renamed.title, "rustlang");

        // Renaming to its own title is fine
        assert!(service.update(rust.id, "RUSTLANG").await.is_ok());
        assert!(matches!(
            service.update(rust.id, "web").await,
            Err(TagServiceError::Conflict(_))
        ));
        assert!(matches!(
            service.update(999, "new").await,
            Err(TagServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_title_normalizes() {
        let service = setup().await;
        let tag = service.create("python").await.unwrap();

        let found = service.get_by_title(" Python").await.unwrap();

        assert_eq!(found, Some(tag));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = setup().await;
        let tag = service.create("gone").await.unwrap();

        service.delete(tag.id).await.unwrap();

        assert!(service.get_by_id(tag.id).await.unwrap().is_none());
        assert!(matches!(
            service.delete(tag.id).await,
            Err(TagServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_popular_is_invalidated_on_create() {
        let service = setup().await;
        service.create("a").await.unwrap();
        assert_eq!(service.popular(10).await.unwrap().len(), 1);

        service.create("b").await.unwrap();

        assert_eq!(service.popular(10).await.unwrap().len(), 2);
    }

    /// Misses every title lookup, as if another request inserted the same
    /// title between the check and the write
    struct StaleTitleLookup(SqlxTagRepository);

    #[async_trait::async_trait]
    impl TagRepository for StaleTitleLookup {
        async fn create(&self, title: &str) -> anyhow::Result<Tag> {
            self.0.create(title).await
        }
        async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Tag>> {
            self.0.get_by_id(id).await
        }
        async fn get_by_title(&self, _title: &str) -> anyhow::Result<Option<Tag>> {
            Ok(None)
        }
        async fn update(&self, id: i64, title: &str) -> anyhow::Result<Option<Tag>> {
            self.0.update(id, title).await
        }
        async fn delete(&self, id: i64) -> anyhow::Result<bool> {
            self.0.delete(id).await
        }
        async fn list(&self) -> anyhow::Result<Vec<TagWithCount>> {
            self.0.list().await
        }
        async fn count(&self) -> anyhow::Result<i64> {
            self.0.count().await
        }
        async fn popular(&self, limit: i64) -> anyhow::Result<Vec<TagWithCount>> {
            self.0.popular(limit).await
        }
        async fn for_posts(&self, post_ids: &[i64]) -> anyhow::Result<Vec<(i64, TagWithCount)>> {
            self.0.for_posts(post_ids).await
        }
        async fn existing_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
            self.0.existing_ids(ids).await
        }
    }

    #[tokio::test]
    async fn test_racing_duplicate_is_conflict() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = TagService::new(
            Arc::new(StaleTitleLookup(SqlxTagRepository::new(pool))),
            Arc::new(MemoryCache::new()),
        );
        service.create("rust").await.unwrap();
        let web = service.create("web").await.unwrap();

        assert!(matches!(
            service.create("Rust").await,
            Err(TagServiceError::Conflict(t)) if t == "rust"
        ));
        assert!(matches!(
            service.update(web.id, "rust").await,
            Err(TagServiceError::Conflict(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn property_clean_title_is_lowercase_and_bounded(title in "[a-zA-Z ]{1,30}") {
            match TagService::clean_title(&title) {
                Ok(clean) => {
                    prop_assert_eq!(clean.clone(), clean.to_lowercase());
                    prop_assert!(!clean.is_empty());
                    prop_assert!(clean.chars().count() <= TAG_TITLE_MAX_LEN);
                }
                Err(TagServiceError::ValidationError(_)) => {
                    let trimmed = title.trim();
                    prop_assert!(trimmed.is_empty() || trimmed.chars().count() > TAG_TITLE_MAX_LEN);
                }
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }
    }
}
