//! Comment repository
//!
//! Comments are always listed oldest first. Listings join the author's
//! username and the post's title.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithMeta};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment. `comment.id` is ignored.
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<CommentWithMeta>>;

    /// Update every column of a comment
    async fn update(&self, comment: &Comment) -> Result<Option<CommentWithMeta>>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Comments under a post, oldest first
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithMeta>>;

    /// All comments, oldest first, paginated
    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<CommentWithMeta>, i64)>;

    /// Count total comments
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    /// Create a new SQLx comment repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

const META_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, c.text, c.published_at,
           u.username AS author_username, p.title AS post_title
    FROM comments c
    INNER JOIN users u ON u.id = c.author_id
    INNER JOIN posts p ON p.id = c.post_id
"#;

const ORDER: &str = " ORDER BY c.published_at ASC, c.id ASC";

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        let sql = "INSERT INTO comments (post_id, author_id, text, published_at) VALUES (?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(comment.post_id)
                .bind(comment.author_id)
                .bind(&comment.text)
                .bind(comment.published_at)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to create comment")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(comment.post_id)
                .bind(comment.author_id)
                .bind(&comment.text)
                .bind(comment.published_at)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to create comment")?
                .last_insert_id() as i64,
        };

        Ok(Comment {
            id,
            ..comment.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<CommentWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_comment_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_comment_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn update(&self, comment: &Comment) -> Result<Option<CommentWithMeta>> {
        let sql = "UPDATE comments SET post_id = ?, author_id = ?, text = ?, published_at = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(comment.post_id)
                    .bind(comment.author_id)
                    .bind(&comment.text)
                    .bind(comment.published_at)
                    .bind(comment.id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to update comment")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(comment.post_id)
                    .bind(comment.author_id)
                    .bind(&comment.text)
                    .bind(comment.published_at)
                    .bind(comment.id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to update comment")?;
            }
        }
        self.get_by_id(comment.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM comments WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_for_post_sqlite(sqlite(&self.pool)?, post_id).await,
            DatabaseDriver::Mysql => list_for_post_mysql(mysql(&self.pool)?, post_id).await,
        }
    }

    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<CommentWithMeta>, i64)> {
        let offset = (page - 1).max(0) * per_page;
        let items = match self.pool.driver() {
            DatabaseDriver::Sqlite => list_comments_sqlite(sqlite(&self.pool)?, per_page, offset).await?,
            DatabaseDriver::Mysql => list_comments_mysql(mysql(&self.pool)?, per_page, offset).await?,
        };
        let total = self.count().await?;
        Ok((items, total))
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM comments";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count comments")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count comments")?
                .get("count"),
        };
        Ok(count)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_comment_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<CommentWithMeta>> {
    let sql = format!("{} WHERE c.id = ?", META_SELECT);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment")?;

    Ok(row.as_ref().map(row_to_comment_sqlite))
}

async fn list_for_post_sqlite(pool: &SqlitePool, post_id: i64) -> Result<Vec<CommentWithMeta>> {
    let sql = format!("{} WHERE c.post_id = ?{}", META_SELECT, ORDER);
    let rows = sqlx::query(&sql)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list post comments")?;

    Ok(rows.iter().map(row_to_comment_sqlite).collect())
}

async fn list_comments_sqlite(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<CommentWithMeta>> {
    let sql = format!("{}{} LIMIT ? OFFSET ?", META_SELECT, ORDER);
    let rows = sqlx::query(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows.iter().map(row_to_comment_sqlite).collect())
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> CommentWithMeta {
    CommentWithMeta {
        comment: Comment {
            id: row.get("id"),
            post_id: row.get("post_id"),
            author_id: row.get("author_id"),
            text: row.get("text"),
            published_at: row.get("published_at"),
        },
        author_username: row.get("author_username"),
        post_title: row.get("post_title"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_comment_mysql(pool: &MySqlPool, id: i64) -> Result<Option<CommentWithMeta>> {
    let sql = format!("{} WHERE c.id = ?", META_SELECT);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment")?;

    Ok(row.as_ref().map(row_to_comment_mysql))
}

async fn list_for_post_mysql(pool: &MySqlPool, post_id: i64) -> Result<Vec<CommentWithMeta>> {
    let sql = format!("{} WHERE c.post_id = ?{}", META_SELECT, ORDER);
    let rows = sqlx::query(&sql)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list post comments")?;

    Ok(rows.iter().map(row_to_comment_mysql).collect())
}

async fn list_comments_mysql(pool: &MySqlPool, limit: i64, offset: i64) -> Result<Vec<CommentWithMeta>> {
    let sql = format!("{}{} LIMIT ? OFFSET ?", META_SELECT, ORDER);
    let rows = sqlx::query(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows.iter().map(row_to_comment_mysql).collect())
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> CommentWithMeta {
    CommentWithMeta {
        comment: Comment {
            id: row.get("id"),
            post_id: row.get("post_id"),
            author_id: row.get("author_id"),
            text: row.get("text"),
            published_at: row.get("published_at"),
        },
        author_username: row.get("author_username"),
        post_title: row.get("post_title"),
    }
}
