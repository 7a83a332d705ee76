//! Post service
//!
//! Implements business logic for posts:
//! - Create, read, update, delete with validation
//! - Query helpers (posts of a year, popular, fresh)
//! - Post detail with tags, comments and like count
//! - Likes
//! - Cache invalidation
//!
//! Only active staff users may author posts, and every post carries at
//! least one tag.

use crate::cache::{keys, MemoryCache};
use crate::db::repositories::{
    is_unique_violation, CommentRepository, PostRepository, TagRepository, UserRepository,
};
use crate::models::{
    CommentWithMeta, CreatePostInput, ListParams, PagedResult, Post, PostEntry, PostQuery,
    UpdatePostInput, POST_SLUG_MAX_LEN, POST_TITLE_MAX_LEN,
};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("Post slug already exists: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Everything the post page shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub entry: PostEntry,
    /// Oldest first
    pub comments: Vec<CommentWithMeta>,
}

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
    cache: Arc<MemoryCache>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        tags: Arc<dyn TagRepository>,
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn CommentRepository>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            posts,
            tags,
            users,
            comments,
            cache,
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub async fn create(&self, input: CreatePostInput) -> Result<Post, PostServiceError> {
        let title = validate_title(&input.title)?;
        let slug = validate_slug(&input.slug)?;
        let text = validate_required("Text", &input.text)?;
        let image = validate_required("Image", &input.image)?;
        self.check_slug_free(&slug, None).await?;
        self.check_author(input.author_id).await?;
        let tag_ids = self.check_tags(&input.tag_ids).await?;
        let like_ids = self.check_likes(&input.like_ids).await?;

        let post = Post {
            id: 0,
            title,
            text,
            slug,
            image,
            published_at: input.published_at.unwrap_or_else(Utc::now),
            author_id: input.author_id,
        };

        let created = self
            .posts
            .create(&post, &tag_ids, &like_ids)
            .await
            .map_err(|e| write_error(e, &post.slug, "Failed to create post"))?;

        tracing::info!("Created post {} ({})", created.slug, created.id);
        self.invalidate().await;
        Ok(created)
    }

    /// Apply the fields present in `input`. Tags and likes are replaced
    /// wholesale when given.
    pub async fn update(&self, id: i64, input: UpdatePostInput) -> Result<Post, PostServiceError> {
        let mut post = self
            .posts
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::NotFound(id.to_string()))?;

        if !input.has_changes() {
            return Ok(post);
        }

        if let Some(title) = &input.title {
            post.title = validate_title(title)?;
        }
        if let Some(slug) = &input.slug {
            let slug = validate_slug(slug)?;
            if slug != post.slug {
                self.check_slug_free(&slug, Some(id)).await?;
            }
            post.slug = slug;
        }
        if let Some(text) = &input.text {
            post.text = validate_required("Text", text)?;
        }
        if let Some(image) = &input.image {
            post.image = validate_required("Image", image)?;
        }
        if let Some(published_at) = input.published_at {
            post.published_at = published_at;
        }
        if let Some(author_id) = input.author_id {
            self.check_author(author_id).await?;
            post.author_id = author_id;
        }
        let tag_ids = match &input.tag_ids {
            Some(ids) => Some(self.check_tags(ids).await?),
            None => None,
        };
        let like_ids = match &input.like_ids {
            Some(ids) => Some(self.check_likes(ids).await?),
            None => None,
        };

        let updated = self
            .posts
            .update(&post, tag_ids.as_deref(), like_ids.as_deref())
            .await
            .map_err(|e| write_error(e, &post.slug, "Failed to update post"))?;

        self.invalidate().await;
        Ok(updated)
    }

    /// Delete a post with its comments, likes and tag links
    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        let deleted = self.posts.delete(id).await.context("Failed to delete post")?;
        if !deleted {
            return Err(PostServiceError::NotFound(id.to_string()));
        }
        tracing::info!("Deleted post {}", id);
        self.invalidate().await;
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>, PostServiceError> {
        self.posts
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")
            .map_err(Into::into)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, PostServiceError> {
        self.posts
            .get_by_slug(slug)
            .await
            .context("Failed to get post by slug")
            .map_err(Into::into)
    }

    /// Tag and liking-user IDs of a post, as shown in the admin form
    pub async fn relations(&self, id: i64) -> Result<(Vec<i64>, Vec<i64>), PostServiceError> {
        let tag_ids = self.posts.tag_ids(id).await.context("Failed to get post tags")?;
        let like_ids = self.posts.like_ids(id).await.context("Failed to get post likes")?;
        Ok((tag_ids, like_ids))
    }

    /// Evaluate a query. Unpaginated queries get the first default page.
    pub async fn list(&self, query: PostQuery) -> Result<PagedResult<PostEntry>, PostServiceError> {
        if let Some(year) = query.year {
            if query.year_range().is_none() {
                return Err(PostServiceError::ValidationError(format!(
                    "Year {} is out of range",
                    year
                )));
            }
        }
        let params = query.page.unwrap_or_default();
        let query = query.paginate(params);

        let entries = self.posts.query(&query).await.context("Failed to query posts")?;
        let total = self.posts.count(&query).await.context("Failed to count posts")?;
        Ok(PagedResult::new(entries, total, &params))
    }

    /// Posts published in `year`, oldest first, with tags and comment counts
    pub async fn posts_of_year(
        &self,
        year: i32,
        params: ListParams,
    ) -> Result<PagedResult<PostEntry>, PostServiceError> {
        self.list(listing().year(year).paginate(params)).await
    }

    /// Most liked posts first. Cached per page.
    pub async fn popular(&self, params: ListParams) -> Result<PagedResult<PostEntry>, PostServiceError> {
        let key = keys::popular_posts(params.page, params.per_page);
        match self.cache.get::<PagedResult<PostEntry>>(&key).await {
            Ok(Some(page)) => return Ok(page),
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring unreadable cache entry {}: {}", key, e),
        }

        let page = self.list(listing().popular().paginate(params)).await?;
        if let Err(e) = self.cache.set(&key, &page).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        Ok(page)
    }

    /// Newest posts first
    pub async fn fresh(&self, params: ListParams) -> Result<PagedResult<PostEntry>, PostServiceError> {
        self.list(listing().fresh().paginate(params)).await
    }

    /// A post with its tags, like count and comments
    pub async fn detail(&self, slug: &str) -> Result<PostDetail, PostServiceError> {
        let post = self
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| PostServiceError::NotFound(slug.to_string()))?;

        let likes_count = self
            .posts
            .likes_count(post.id)
            .await
            .context("Failed to count likes")?;
        let tags = self
            .tags
            .for_posts(&[post.id])
            .await
            .context("Failed to get post tags")?
            .into_iter()
            .map(|(_, tag)| tag)
            .collect();
        let comments = self
            .comments
            .list_for_post(post.id)
            .await
            .context("Failed to list comments")?;

        let mut entry = PostEntry::new(post, likes_count);
        entry.tags = Some(tags);
        entry.comments_count = Some(comments.len() as i64);
        Ok(PostDetail { entry, comments })
    }

    pub async fn count(&self) -> Result<i64, PostServiceError> {
        self.posts
            .count(&PostQuery::new())
            .await
            .context("Failed to count posts")
            .map_err(Into::into)
    }

    // ========================================================================
    // Likes
    // ========================================================================

    /// Like a post by slug. Liking twice is a no-op. Returns the new count.
    pub async fn like(&self, slug: &str, user_id: i64) -> Result<i64, PostServiceError> {
        let post = self.require_slug(slug).await?;
        if self.posts.like(post.id, user_id).await.context("Failed to like post")? {
            self.invalidate().await;
        }
        self.likes_count(post.id).await
    }

    /// Remove a like by slug. Returns the new count.
    pub async fn unlike(&self, slug: &str, user_id: i64) -> Result<i64, PostServiceError> {
        let post = self.require_slug(slug).await?;
        if self
            .posts
            .unlike(post.id, user_id)
            .await
            .context("Failed to unlike post")?
        {
            self.invalidate().await;
        }
        self.likes_count(post.id).await
    }

    pub async fn is_liked(&self, post_id: i64, user_id: i64) -> Result<bool, PostServiceError> {
        self.posts
            .is_liked(post_id, user_id)
            .await
            .context("Failed to check like")
            .map_err(Into::into)
    }

    pub async fn likes_count(&self, post_id: i64) -> Result<i64, PostServiceError> {
        self.posts
            .likes_count(post_id)
            .await
            .context("Failed to count likes")
            .map_err(Into::into)
    }

    /// Drop cached post and tag listings
    pub async fn invalidate(&self) {
        self.cache.delete_pattern(keys::POSTS_PATTERN).await;
        self.cache.delete_pattern(keys::TAGS_PATTERN).await;
    }

    // ========================================================================
    // Checks
    // ========================================================================

    async fn require_slug(&self, slug: &str) -> Result<Post, PostServiceError> {
        self.get_by_slug(slug)
            .await?
            .ok_or_else(|| PostServiceError::NotFound(slug.to_string()))
    }

    async fn check_slug_free(&self, slug: &str, own_id: Option<i64>) -> Result<(), PostServiceError> {
        let existing = self
            .posts
            .get_by_slug(slug)
            .await
            .context("Failed to check slug")?;
        match existing {
            Some(post) if Some(post.id) != own_id => Err(PostServiceError::Conflict(slug.to_string())),
            _ => Ok(()),
        }
    }

    async fn check_author(&self, author_id: i64) -> Result<(), PostServiceError> {
        let author = self
            .users
            .get_by_id(author_id)
            .await
            .context("Failed to get author")?
            .ok_or_else(|| {
                PostServiceError::ValidationError(format!("Author {} does not exist", author_id))
            })?;
        if !author.can_author_posts() {
            return Err(PostServiceError::ValidationError(format!(
                "Author {} is not an active staff user",
                author.username
            )));
        }
        Ok(())
    }

    async fn check_tags(&self, tag_ids: &[i64]) -> Result<Vec<i64>, PostServiceError> {
        let ids = dedup(tag_ids);
        if ids.is_empty() {
            return Err(PostServiceError::ValidationError(
                "A post needs at least one tag".to_string(),
            ));
        }
        let found = self
            .tags
            .existing_ids(&ids)
            .await
            .context("Failed to look up tags")?;
        if let Some(missing) = first_missing(&ids, &found) {
            return Err(PostServiceError::ValidationError(format!(
                "Tag {} does not exist",
                missing
            )));
        }
        Ok(ids)
    }

    async fn check_likes(&self, user_ids: &[i64]) -> Result<Vec<i64>, PostServiceError> {
        let ids = dedup(user_ids);
        if ids.is_empty() {
            return Ok(ids);
        }
        let found = self
            .users
            .existing_ids(&ids)
            .await
            .context("Failed to look up users")?;
        if let Some(missing) = first_missing(&ids, &found) {
            return Err(PostServiceError::ValidationError(format!(
                "User {} does not exist",
                missing
            )));
        }
        Ok(ids)
    }
}

/// Map a failed post write; a slug taken by a concurrent write is a conflict
fn write_error(err: anyhow::Error, slug: &str, context: &'static str) -> PostServiceError {
    if is_unique_violation(&err) {
        PostServiceError::Conflict(slug.to_string())
    } else {
        err.context(context).into()
    }
}

/// Public listings show tags and comment counts
fn listing() -> PostQuery {
    PostQuery::new().prefetch_tags().with_comments_count()
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn first_missing(wanted: &[i64], found: &[i64]) -> Option<i64> {
    wanted.iter().copied().find(|id| !found.contains(id))
}

fn validate_title(title: &str) -> Result<String, PostServiceError> {
    let title = validate_required("Title", title)?;
    if title.chars().count() > POST_TITLE_MAX_LEN {
        return Err(PostServiceError::ValidationError(format!(
            "Title must be at most {} characters",
            POST_TITLE_MAX_LEN
        )));
    }
    Ok(title)
}

fn validate_slug(slug: &str) -> Result<String, PostServiceError> {
    let slug = slug.trim();
    if !Post::is_valid_slug(slug) {
        return Err(PostServiceError::ValidationError(
            "Slug may contain only letters, digits, hyphens and underscores".to_string(),
        ));
    }
    if slug.len() > POST_SLUG_MAX_LEN {
        return Err(PostServiceError::ValidationError(format!(
            "Slug must be at most {} characters",
            POST_SLUG_MAX_LEN
        )));
    }
    Ok(slug.to_string())
}

fn validate_required(field: &str, value: &str) -> Result<String, PostServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PostServiceError::ValidationError(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxPostRepository, SqlxTagRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{Comment, User};
    use chrono::TimeZone;
    use proptest::prelude::*;

    struct Fixture {
        pool: DynDatabasePool,
        service: PostService,
        staff: User,
        reader: User,
        rust: i64,
        web: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::boxed(pool.clone());
        let tags = SqlxTagRepository::boxed(pool.clone());

        let mut staff = User::new("editor".into(), "editor@example.com".into(), "hash".into());
        staff.is_staff = true;
        let staff = users.create(&staff).await.expect("Failed to create staff");
        let reader = users
            .create(&User::new("reader".into(), "".into(), "hash".into()))
            .await
            .expect("Failed to create reader");
        let rust = tags.create("rust").await.expect("Failed to create tag").id;
        let web = tags.create("web").await.expect("Failed to create tag").id;

        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            tags,
            users,
            SqlxCommentRepository::boxed(pool.clone()),
            Arc::new(MemoryCache::new()),
        );

        Fixture {
            pool,
            service,
            staff,
            reader,
            rust,
            web,
        }
    }

    fn input(f: &Fixture, slug: &str) -> CreatePostInput {
        CreatePostInput::new("A post", slug, "Body", "posts/cover.png", f.staff.id).with_tags(vec![f.rust])
    }

    // ========================================================================
    // Create / update / delete
    // ========================================================================

    #[tokio::test]
    async fn test_create_post() {
        let f = setup().await;
        let at = Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap();

        let post = f
            .service
            .create(
                input(&f, "first")
                    .with_tags(vec![f.web, f.rust, f.rust])
                    .with_likes(vec![f.reader.id])
                    .published_at(at),
            )
            .await
            .expect("Failed to create post");

        assert_eq!(post.slug, "first");
        assert_eq!(post.published_at, at);
        let (tags, likes) = f.service.relations(post.id).await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(likes, vec![f.reader.id]);
    }

    #[tokio::test]
    async fn test_create_requires_staff_author() {
        let f = setup().await;

        let mut by_reader = input(&f, "x");
        by_reader.author_id = f.reader.id;
        assert!(matches!(
            f.service.create(by_reader).await,
            Err(PostServiceError::ValidationError(_))
        ));

        let mut by_nobody = input(&f, "y");
        by_nobody.author_id = 999;
        assert!(matches!(
            f.service.create(by_nobody).await,
            Err(PostServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_requires_existing_tags() {
        let f = setup().await;

        let untagged = input(&f, "untagged").with_tags(vec![]);
        assert!(matches!(
            f.service.create(untagged).await,
            Err(PostServiceError::ValidationError(_))
        ));

        let unknown = input(&f, "unknown").with_tags(vec![f.rust, 999]);
        assert!(matches!(
            f.service.create(unknown).await,
            Err(PostServiceError::ValidationError(m)) if m.contains("999")
        ));

        let bad_like = input(&f, "bad-like").with_likes(vec![999]);
        assert!(matches!(
            f.service.create(bad_like).await,
            Err(PostServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let f = setup().await;

        let mut cases = Vec::new();
        let mut i = input(&f, "ok");
        i.title = "  ".into();
        cases.push(i);
        let mut i = input(&f, "ok");
        i.title = "t".repeat(POST_TITLE_MAX_LEN + 1);
        cases.push(i);
        cases.push(input(&f, "not a slug"));
        cases.push(input(&f, ""));
        let mut i = input(&f, "ok");
        i.text = "".into();
        cases.push(i);
        let mut i = input(&f, "ok");
        i.image = "".into();
        cases.push(i);

        for case in cases {
            assert!(matches!(
                f.service.create(case).await,
                Err(PostServiceError::ValidationError(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let f = setup().await;
        f.service.create(input(&f, "same")).await.unwrap();

        assert!(matches!(
            f.service.create(input(&f, "same")).await,
            Err(PostServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_post() {
        let f = setup().await;
        let post = f.service.create(input(&f, "draft")).await.unwrap();
        let other = f.service.create(input(&f, "other")).await.unwrap();

        let updated = f
            .service
            .update(
                post.id,
                UpdatePostInput {
                    title: Some("Renamed".into()),
                    slug: Some("renamed".into()),
                    tag_ids: Some(vec![f.web]),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update post");

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.text, "Body");
        assert_eq!(f.service.relations(post.id).await.unwrap().0, vec![f.web]);

        let clash = UpdatePostInput {
            slug: Some(other.slug.clone()),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(post.id, clash).await,
            Err(PostServiceError::Conflict(_))
        ));

        let to_reader = UpdatePostInput {
            author_id: Some(f.reader.id),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(post.id, to_reader).await,
            Err(PostServiceError::ValidationError(_))
        ));

        let no_tags = UpdatePostInput {
            tag_ids: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(post.id, no_tags).await,
            Err(PostServiceError::ValidationError(_))
        ));

        assert!(matches!(
            f.service.update(999, UpdatePostInput::default()).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_post() {
        let f = setup().await;
        let post = f.service.create(input(&f, "gone")).await.unwrap();

        f.service.delete(post.id).await.unwrap();

        assert!(f.service.get_by_id(post.id).await.unwrap().is_none());
        assert!(matches!(
            f.service.delete(post.id).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    // ========================================================================
    // Query helpers
    // ========================================================================

    #[tokio::test]
    async fn test_posts_of_year() {
        let f = setup().await;
        for (slug, year, month) in [("late", 2023, 12), ("early", 2023, 1), ("next", 2024, 1)] {
            let at = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
            f.service.create(input(&f, slug).published_at(at)).await.unwrap();
        }

        let page = f.service.posts_of_year(2023, ListParams::default()).await.unwrap();

        let slugs: Vec<_> = page.items.iter().map(|e| e.post.slug.as_str()).collect();
        assert_eq!(slugs, vec!["early", "late"]);
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|e| e.tags.is_some() && e.comments_count == Some(0)));
    }

    #[tokio::test]
    async fn test_posts_of_year_out_of_range() {
        let f = setup().await;
        f.service.create(input(&f, "now")).await.unwrap();

        for year in [300_000, -300_000, i32::MAX] {
            assert!(matches!(
                f.service.posts_of_year(year, ListParams::default()).await,
                Err(PostServiceError::ValidationError(_))
            ));
        }
        assert!(matches!(
            f.service.list(PostQuery::new().year(300_000)).await,
            Err(PostServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_slug_taken_during_write_is_conflict() {
        let f = setup().await;
        let taken = f.service.create(input(&f, "taken")).await.unwrap();
        let repo = SqlxPostRepository::new(f.pool.clone());

        let err = repo
            .create(&Post { id: 0, ..taken }, &[f.rust], &[])
            .await
            .expect_err("Duplicate slug accepted");

        assert!(matches!(
            write_error(err, "taken", "Failed to create post"),
            PostServiceError::Conflict(slug) if slug == "taken"
        ));
        assert!(matches!(
            write_error(anyhow::anyhow!("disk full"), "taken", "Failed to create post"),
            PostServiceError::InternalError(_)
        ));
    }

    #[tokio::test]
    async fn test_popular_and_fresh() {
        let f = setup().await;
        let old = f
            .service
            .create(
                input(&f, "old")
                    .with_likes(vec![f.reader.id, f.staff.id])
                    .published_at(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            )
            .await
            .unwrap();
        f.service.create(input(&f, "new")).await.unwrap();

        let popular = f.service.popular(ListParams::default()).await.unwrap();
        assert_eq!(popular.items[0].post.id, old.id);
        assert_eq!(popular.items[0].likes_count, 2);

        let fresh = f.service.fresh(ListParams::default()).await.unwrap();
        assert_eq!(fresh.items[0].post.slug, "new");
        assert_eq!(fresh.items[1].likes_count, 2);
    }

    #[tokio::test]
    async fn test_popular_cache_invalidated_by_likes() {
        let f = setup().await;
        f.service.create(input(&f, "a")).await.unwrap();
        f.service
            .create(input(&f, "b").published_at(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()))
            .await
            .unwrap();

        let before = f.service.popular(ListParams::default()).await.unwrap();
        assert_eq!(before.items[0].post.slug, "a");

        assert_eq!(f.service.like("b", f.reader.id).await.unwrap(), 1);

        let after = f.service.popular(ListParams::default()).await.unwrap();
        assert_eq!(after.items[0].post.slug, "b");
    }

    #[tokio::test]
    async fn test_detail() {
        let f = setup().await;
        let post = f
            .service
            .create(input(&f, "detail").with_tags(vec![f.web, f.rust]))
            .await
            .unwrap();
        f.service.like("detail", f.reader.id).await.unwrap();
        let comments = SqlxCommentRepository::new(f.pool.clone());
        for text in ["first", "second"] {
            comments
                .create(&Comment {
                    id: 0,
                    post_id: post.id,
                    author_id: f.reader.id,
                    text: text.into(),
                    published_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let detail = f.service.detail("detail").await.expect("Failed to get detail");

        assert_eq!(detail.entry.likes_count, 1);
        let titles: Vec<_> = detail
            .entry
            .tags
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| t.tag.title.as_str())
            .collect();
        assert_eq!(titles, vec!["rust", "web"]);
        assert_eq!(detail.comments.len(), 2);
        assert_eq!(detail.comments[0].comment.text, "first");
        assert_eq!(detail.entry.comments_count, Some(2));

        assert!(matches!(
            f.service.detail("missing").await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let f = setup().await;
        let post = f.service.create(input(&f, "liked")).await.unwrap();

        assert_eq!(f.service.like("liked", f.reader.id).await.unwrap(), 1);
        assert_eq!(f.service.like("liked", f.reader.id).await.unwrap(), 1);
        assert!(f.service.is_liked(post.id, f.reader.id).await.unwrap());

        assert_eq!(f.service.unlike("liked", f.reader.id).await.unwrap(), 0);
        assert_eq!(f.service.unlike("liked", f.reader.id).await.unwrap(), 0);
        assert!(matches!(
            f.service.like("missing", f.reader.id).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn property_valid_slugs_pass(slug in "[-a-zA-Z0-9_]{1,200}") {
            prop_assert_eq!(validate_slug(&slug).unwrap(), slug);
        }

        #[test]
        fn property_slugs_with_other_chars_fail(
            prefix in "[a-z]{0,5}",
            bad in "[/.?#%!]",
            suffix in "[a-z]{1,5}",
        ) {
            let slug = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(validate_slug(&slug).is_err());
        }
    }
}
