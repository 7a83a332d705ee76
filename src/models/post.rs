//! Post model
//!
//! This module provides:
//! - `Post` entity and its create/update inputs
//! - `PostQuery`, a chainable description of a post listing that a
//!   repository evaluates
//! - `PostEntry`, a post with the annotations a query asked for
//! - Pagination types for list queries

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::tag::TagWithCount;

/// Maximum length of a post title, in characters
pub const POST_TITLE_MAX_LEN: usize = 200;
/// Maximum length of a post slug, in characters
pub const POST_SLUG_MAX_LEN: usize = 200;

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    pub title: String,
    /// Body text
    pub text: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Media path of the cover image
    pub image: String,
    pub published_at: DateTime<Utc>,
    /// Author user ID, always a staff user
    pub author_id: i64,
}

impl Post {
    /// Public URL of the post detail page
    pub fn absolute_url(&self) -> String {
        format!("/post/{}", self.slug)
    }

    /// Whether `slug` contains only letters, digits, hyphens and underscores
    pub fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Input for creating a post. Author, tags and likes are raw ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub text: String,
    pub slug: String,
    pub image: String,
    /// Defaults to now
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: i64,
    /// At least one tag is required
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub like_ids: Vec<i64>,
}

impl CreatePostInput {
    pub fn new(title: &str, slug: &str, text: &str, image: &str, author_id: i64) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
            slug: slug.to_string(),
            image: image.to_string(),
            published_at: None,
            author_id,
            tag_ids: Vec::new(),
            like_ids: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tag_ids: Vec<i64>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn with_likes(mut self, like_ids: Vec<i64>) -> Self {
        self.like_ids = like_ids;
        self
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// Input for updating a post. `tag_ids` and `like_ids` replace the whole
/// relation when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub text: Option<String>,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<i64>,
    pub tag_ids: Option<Vec<i64>>,
    pub like_ids: Option<Vec<i64>>,
}

impl UpdatePostInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.text.is_some()
            || self.slug.is_some()
            || self.image.is_some()
            || self.published_at.is_some()
            || self.author_id.is_some()
            || self.tag_ids.is_some()
            || self.like_ids.is_some()
    }
}

/// Ordering of a post listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostOrdering {
    /// `published_at` descending
    #[default]
    #[serde(alias = "fresh")]
    Newest,
    /// `published_at` ascending
    Chronological,
    /// Like count descending, newest first among equals
    Popular,
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 0;
        }
        ((self.total as u64 + self.per_page as u64 - 1) / self.per_page as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map the items, keeping pagination data
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// A lazily evaluated post listing.
///
/// Builders only record what is wanted; nothing runs until
/// `PostRepository::query` or `PostRepository::count` evaluates it.
///
/// ```ignore
/// let query = PostQuery::new().year(2023).prefetch_tags().with_comments_count();
/// let entries = repo.query(&query).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub year: Option<i32>,
    pub tag_id: Option<i64>,
    pub author_id: Option<i64>,
    pub ordering: PostOrdering,
    pub prefetch_tags: bool,
    pub with_comments_count: bool,
    pub page: Option<ListParams>,
}

impl PostQuery {
    /// All posts, newest first
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts published in calendar year `year` (UTC), oldest first
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self.ordering = PostOrdering::Chronological;
        self
    }

    /// Most liked first
    pub fn popular(mut self) -> Self {
        self.ordering = PostOrdering::Popular;
        self
    }

    /// Newest first, with like counts annotated. This orders by date, not
    /// by likes; ranking by likes is [`PostQuery::popular`].
    pub fn fresh(mut self) -> Self {
        self.ordering = PostOrdering::Newest;
        self
    }

    pub fn ordering(mut self, ordering: PostOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Load each post's tags, ordered by title, with per-tag post counts
    pub fn prefetch_tags(mut self) -> Self {
        self.prefetch_tags = true;
        self
    }

    /// Annotate each post with its number of comments
    pub fn with_comments_count(mut self) -> Self {
        self.with_comments_count = true;
        self
    }

    pub fn tagged(mut self, tag_id: i64) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    pub fn by_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn paginate(mut self, params: ListParams) -> Self {
        self.page = Some(params);
        self
    }

    /// Half-open `[start, end)` range of `published_at` for the year filter
    pub fn year_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let year = self.year?;
        let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
        let end = Utc.with_ymd_and_hms(year.checked_add(1)?, 1, 1, 0, 0, 0).single()?;
        Some((start, end))
    }

    /// `ORDER BY` clause for the `p` posts alias and the `likes_count` column
    pub fn order_clause(&self) -> &'static str {
        match self.ordering {
            PostOrdering::Newest => "p.published_at DESC, p.id DESC",
            PostOrdering::Chronological => "p.published_at ASC, p.id ASC",
            PostOrdering::Popular => "likes_count DESC, p.published_at DESC, p.id DESC",
        }
    }
}

/// A post with the annotations requested by its query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostEntry {
    #[serde(flatten)]
    pub post: Post,
    pub likes_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagWithCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<i64>,
}

impl PostEntry {
    pub fn new(post: Post, likes_count: i64) -> Self {
        Self {
            post,
            likes_count,
            tags: None,
            comments_count: None,
        }
    }

    /// Year the post was published in, UTC
    pub fn year(&self) -> i32 {
        self.post.published_at.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_post() -> Post {
        Post {
            id: 1,
            title: "Hello".into(),
            text: "World".into(),
            slug: "hello-world".into(),
            image: "posts/hello.png".into(),
            published_at: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap(),
            author_id: 1,
        }
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(sample_post().absolute_url(), "/post/hello-world");
    }

    #[test]
    fn test_slug_validation() {
        assert!(Post::is_valid_slug("hello-world_2"));
        assert!(!Post::is_valid_slug(""));
        assert!(!Post::is_valid_slug("hello world"));
        assert!(!Post::is_valid_slug("hello/world"));
    }

    #[test]
    fn test_year_sets_chronological_order() {
        let query = PostQuery::new().year(2023);
        assert_eq!(query.ordering, PostOrdering::Chronological);

        let (start, end) = query.year_range().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_builders_chain() {
        let query = PostQuery::new()
            .popular()
            .prefetch_tags()
            .with_comments_count()
            .tagged(4)
            .paginate(ListParams::new(2, 5));

        assert_eq!(query.ordering, PostOrdering::Popular);
        assert!(query.prefetch_tags);
        assert!(query.with_comments_count);
        assert_eq!(query.tag_id, Some(4));
        assert_eq!(query.page, Some(ListParams { page: 2, per_page: 5 }));
        assert!(query.order_clause().starts_with("likes_count DESC"));
        assert_eq!(PostQuery::new().popular().fresh().ordering, PostOrdering::Newest);
    }

    #[test]
    fn test_no_year_no_range() {
        assert!(PostQuery::new().year_range().is_none());
    }

    #[test]
    fn test_entry_serialization_skips_missing_annotations() {
        let entry = PostEntry::new(sample_post(), 3);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["slug"], "hello-world");
        assert_eq!(json["likes_count"], 3);
        assert!(json.get("tags").is_none());
        assert!(json.get("comments_count").is_none());
        assert_eq!(entry.year(), 2023);
    }

    #[test]
    fn test_paged_result_pages() {
        let params = ListParams::new(1, 10);
        let result = PagedResult::new(vec![1, 2, 3], 25, &params);
        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());

        let empty: PagedResult<i32> = PagedResult::new(vec![], 0, &params);
        assert_eq!(empty.total_pages(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_update_has_changes() {
        assert!(!UpdatePostInput::default().has_changes());
        let update = UpdatePostInput {
            tag_ids: Some(vec![1]),
            ..Default::default()
        };
        assert!(update.has_changes());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn property_list_params_are_clamped(page in 0u32..10_000, per_page in 0u32..10_000) {
            let params = ListParams::new(page, per_page);
            prop_assert!(params.page >= 1);
            prop_assert!((1..=100).contains(&params.per_page));
            prop_assert_eq!(params.offset(), (params.page as i64 - 1) * params.per_page as i64);
        }

        #[test]
        fn property_valid_slugs_match(slug in "[-a-zA-Z0-9_]{1,50}") {
            prop_assert!(Post::is_valid_slug(&slug));
        }
    }
}
