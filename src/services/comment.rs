//! Comment service
//!
//! Post listings carry comment counts, so every write drops the cached
//! post listings.

use crate::cache::{keys, MemoryCache};
use crate::db::repositories::{CommentRepository, PostRepository, UserRepository};
use crate::models::{
    Comment, CommentWithMeta, CreateCommentInput, ListParams, PagedResult, UpdateCommentInput,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Comment not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    cache: Arc<MemoryCache>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            comments,
            posts,
            users,
            cache,
        }
    }

    /// Create a comment. The post and the author must exist.
    pub async fn create(&self, input: CreateCommentInput) -> Result<CommentWithMeta, CommentServiceError> {
        let text = validate_text(&input.text)?;
        self.check_post(input.post_id).await?;
        self.check_author(input.author_id).await?;

        let comment = Comment {
            id: 0,
            post_id: input.post_id,
            author_id: input.author_id,
            text,
            published_at: input.published_at.unwrap_or_else(Utc::now),
        };
        let created = self
            .comments
            .create(&comment)
            .await
            .context("Failed to create comment")?;

        tracing::debug!("Comment {} added to post {}", created.id, created.post_id);
        self.invalidate().await;
        self.require(created.id).await
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateCommentInput,
    ) -> Result<CommentWithMeta, CommentServiceError> {
        let mut comment = self.require(id).await?.comment;

        if let Some(text) = &input.text {
            comment.text = validate_text(text)?;
        }
        if let Some(post_id) = input.post_id {
            self.check_post(post_id).await?;
            comment.post_id = post_id;
        }
        if let Some(author_id) = input.author_id {
            self.check_author(author_id).await?;
            comment.author_id = author_id;
        }
        if let Some(published_at) = input.published_at {
            comment.published_at = published_at;
        }

        let updated = self
            .comments
            .update(&comment)
            .await
            .context("Failed to update comment")?
            .ok_or_else(|| CommentServiceError::NotFound(id.to_string()))?;
        self.invalidate().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CommentServiceError> {
        let deleted = self
            .comments
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        if !deleted {
            return Err(CommentServiceError::NotFound(id.to_string()));
        }
        self.invalidate().await;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<CommentWithMeta>, CommentServiceError> {
        self.comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")
            .map_err(Into::into)
    }

    /// Comments under a post, oldest first
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithMeta>, CommentServiceError> {
        self.comments
            .list_for_post(post_id)
            .await
            .context("Failed to list comments")
            .map_err(Into::into)
    }

    /// Every comment, for the admin list
    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<CommentWithMeta>, CommentServiceError> {
        let (items, total) = self
            .comments
            .list(params.page as i64, params.per_page as i64)
            .await
            .context("Failed to list comments")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn count(&self) -> Result<i64, CommentServiceError> {
        self.comments
            .count()
            .await
            .context("Failed to count comments")
            .map_err(Into::into)
    }

    /// Drop cached post listings
    async fn invalidate(&self) {
        self.cache.delete_pattern(keys::POSTS_PATTERN).await;
    }

    async fn require(&self, id: i64) -> Result<CommentWithMeta, CommentServiceError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CommentServiceError::NotFound(id.to_string()))
    }

    async fn check_post(&self, post_id: i64) -> Result<(), CommentServiceError> {
        let exists = self
            .posts
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .is_some();
        if !exists {
            return Err(CommentServiceError::ValidationError(format!(
                "Post {} does not exist",
                post_id
            )));
        }
        Ok(())
    }

    async fn check_author(&self, author_id: i64) -> Result<(), CommentServiceError> {
        let exists = self
            .users
            .get_by_id(author_id)
            .await
            .context("Failed to get user")?
            .is_some();
        if !exists {
            return Err(CommentServiceError::ValidationError(format!(
                "User {} does not exist",
                author_id
            )));
        }
        Ok(())
    }
}

fn validate_text(text: &str) -> Result<String, CommentServiceError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CommentServiceError::ValidationError(
            "Comment cannot be empty".to_string(),
        ));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxPostRepository, SqlxTagRepository, SqlxUserRepository,
        TagRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{Post, User};
    use crate::services::PostService;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        pool: DynDatabasePool,
        service: CommentService,
        post_service: PostService,
        post: Post,
        user: User,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::boxed(pool.clone());
        let posts = SqlxPostRepository::boxed(pool.clone());

        let mut staff = User::new("editor".into(), "".into(), "hash".into());
        staff.is_staff = true;
        let staff = users.create(&staff).await.expect("Failed to create staff");
        let user = users
            .create(&User::new("alice".into(), "".into(), "hash".into()))
            .await
            .expect("Failed to create user");
        let tags = SqlxTagRepository::boxed(pool.clone());
        let tag = tags.create("rust").await.unwrap();
        let post = posts
            .create(
                &Post {
                    id: 0,
                    title: "Hello".into(),
                    text: "World".into(),
                    slug: "hello".into(),
                    image: "posts/hello.png".into(),
                    published_at: Utc::now(),
                    author_id: staff.id,
                },
                &[tag.id],
                &[],
            )
            .await
            .expect("Failed to create post");

        let comments = SqlxCommentRepository::boxed(pool.clone());
        let cache = Arc::new(MemoryCache::new());
        let post_service = PostService::new(
            posts.clone(),
            tags,
            users.clone(),
            comments.clone(),
            cache.clone(),
        );
        let service = CommentService::new(comments, posts, users, cache);
        Fixture {
            pool,
            service,
            post_service,
            post,
            user,
        }
    }

    #[tokio::test]
    async fn test_create_comment() {
        let f = setup().await;

        let comment = f
            .service
            .create(CreateCommentInput::new(f.post.id, f.user.id, "  Nice post "))
            .await
            .expect("Failed to create comment");

        assert_eq!(comment.comment.text, "Nice post");
        assert_eq!(comment.to_string(), "alice under Hello");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let f = setup().await;

        for input in [
            CreateCommentInput::new(f.post.id, f.user.id, "   "),
            CreateCommentInput::new(999, f.user.id, "text"),
            CreateCommentInput::new(f.post.id, 999, "text"),
        ] {
            assert!(matches!(
                f.service.create(input).await,
                Err(CommentServiceError::ValidationError(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_list_for_post_oldest_first() {
        let f = setup().await;
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        for (text, offset) in [("second", 2), ("first", 1), ("third", 3)] {
            let mut input = CreateCommentInput::new(f.post.id, f.user.id, text);
            input.published_at = Some(base + Duration::hours(offset));
            f.service.create(input).await.unwrap();
        }

        let texts: Vec<_> = f
            .service
            .list_for_post(f.post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.comment.text)
            .collect();

        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(f.service.count().await.unwrap(), 3);
        let page = f.service.list(&ListParams::new(1, 2)).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let f = setup().await;
        let created = f
            .service
            .create(CreateCommentInput::new(f.post.id, f.user.id, "draft"))
            .await
            .unwrap();
        let id = created.comment.id;

        let updated = f
            .service
            .update(
                id,
                UpdateCommentInput {
                    text: Some("final".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.comment.text, "final");

        let bad_author = UpdateCommentInput {
            author_id: Some(999),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(id, bad_author).await,
            Err(CommentServiceError::ValidationError(_))
        ));

        f.service.delete(id).await.unwrap();
        assert!(matches!(
            f.service.delete(id).await,
            Err(CommentServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_comment_writes_refresh_popular_counts() {
        let f = setup().await;
        let comments_count = |page: PagedResult<crate::models::PostEntry>| page.items[0].comments_count;

        let cached = f.post_service.popular(ListParams::default()).await.unwrap();
        assert_eq!(comments_count(cached), Some(0));

        let created = f
            .service
            .create(CreateCommentInput::new(f.post.id, f.user.id, "first"))
            .await
            .unwrap();
        let page = f.post_service.popular(ListParams::default()).await.unwrap();
        assert_eq!(comments_count(page), Some(1));

        f.service.delete(created.comment.id).await.unwrap();
        let page = f.post_service.popular(ListParams::default()).await.unwrap();
        assert_eq!(comments_count(page), Some(0));
    }

    #[tokio::test]
    async fn test_comments_removed_with_post() {
        let f = setup().await;
        f.service
            .create(CreateCommentInput::new(f.post.id, f.user.id, "bye"))
            .await
            .unwrap();

        SqlxPostRepository::new(f.pool.clone())
            .delete(f.post.id)
            .await
            .unwrap();

        assert_eq!(f.service.count().await.unwrap(), 0);
    }
}
