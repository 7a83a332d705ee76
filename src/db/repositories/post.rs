//! Post repository
//!
//! This module provides:
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing the trait for SQLite and MySQL
//!
//! [`PostRepository::query`] evaluates a [`PostQuery`]:
//! 1. one `SELECT` over `posts` with filters, ordering, pagination and the
//!    like count as a correlated subquery;
//! 2. if tags are prefetched, one batched lookup of every listed post's tags;
//! 3. if comment counts are requested, one batched `GROUP BY` over `comments`.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::{Post, PostEntry, PostQuery};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlConnection, MySqlPool, Row, SqliteConnection, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::placeholders;
use super::tag::{SqlxTagRepository, TagRepository};

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post with its tags and likes in one transaction.
    /// `post.id` is ignored.
    async fn create(&self, post: &Post, tag_ids: &[i64], like_ids: &[i64]) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Update every column of a post and replace the relations that are
    /// given, in one transaction
    async fn update(
        &self,
        post: &Post,
        tag_ids: Option<&[i64]>,
        like_ids: Option<&[i64]>,
    ) -> Result<Post>;

    /// Delete a post, cascading to its comments, likes and tag links
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Evaluate a query
    async fn query(&self, query: &PostQuery) -> Result<Vec<PostEntry>>;

    /// Number of posts matching a query's filters, ignoring pagination
    async fn count(&self, query: &PostQuery) -> Result<i64>;

    /// IDs of a post's tags
    async fn tag_ids(&self, post_id: i64) -> Result<Vec<i64>>;

    /// IDs of the users who like a post
    async fn like_ids(&self, post_id: i64) -> Result<Vec<i64>>;

    /// Add a like. Returns false if the user already liked the post.
    async fn like(&self, post_id: i64, user_id: i64) -> Result<bool>;

    /// Remove a like. Returns false if there was none.
    async fn unlike(&self, post_id: i64, user_id: i64) -> Result<bool>;

    /// Whether `user_id` likes the post
    async fn is_liked(&self, post_id: i64, user_id: i64) -> Result<bool>;

    /// Number of likes on a post
    async fn likes_count(&self, post_id: i64) -> Result<i64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
    tags: SqlxTagRepository,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            tags: SqlxTagRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const POST_COLUMNS: &str = "p.id, p.title, p.text, p.slug, p.image, p.published_at, p.author_id";

const LIKES_COUNT_COLUMN: &str =
    "(SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count";

/// A value bound to a `?` of a generated `WHERE` clause
#[derive(Debug, Clone, Copy, PartialEq)]
enum BindValue {
    Int(i64),
    Time(DateTime<Utc>),
}

/// `WHERE` clause and its bind values for a query's filters
fn filter_clause(query: &PostQuery) -> (String, Vec<BindValue>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if query.year.is_some() {
        match query.year_range() {
            Some((start, end)) => {
                conditions.push("p.published_at >= ? AND p.published_at < ?");
                binds.push(BindValue::Time(start));
                binds.push(BindValue::Time(end));
            }
            // Unrepresentable year: nothing was published in it
            None => conditions.push("1 = 0"),
        }
    }
    if let Some(tag_id) = query.tag_id {
        conditions.push("EXISTS (SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ?)");
        binds.push(BindValue::Int(tag_id));
    }
    if let Some(author_id) = query.author_id {
        conditions.push("p.author_id = ?");
        binds.push(BindValue::Int(author_id));
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), binds)
    }
}

/// Main listing statement for a query, with its bind values
fn select_sql(query: &PostQuery) -> (String, Vec<BindValue>) {
    let (filter, mut binds) = filter_clause(query);
    let mut sql = format!(
        "SELECT {}, {} FROM posts p{} ORDER BY {}",
        POST_COLUMNS,
        LIKES_COUNT_COLUMN,
        filter,
        query.order_clause()
    );
    if let Some(page) = query.page {
        sql.push_str(" LIMIT ? OFFSET ?");
        binds.push(BindValue::Int(page.limit()));
        binds.push(BindValue::Int(page.offset()));
    }
    (sql, binds)
}

fn count_sql(query: &PostQuery) -> (String, Vec<BindValue>) {
    let (filter, binds) = filter_clause(query);
    (format!("SELECT COUNT(*) AS count FROM posts p{}", filter), binds)
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post, tag_ids: &[i64], like_ids: &[i64]) -> Result<Post> {
        let links = [(Link::Tags, tag_ids), (Link::Likes, like_ids)];
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => insert_post_sqlite(sqlite(&self.pool)?, post, &links).await?,
            DatabaseDriver::Mysql => insert_post_mysql(mysql(&self.pool)?, post, &links).await?,
        };

        Ok(Post { id, ..post.clone() })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.id = ?", POST_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get post by ID")?;
                Ok(row.as_ref().map(row_to_post_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get post by ID")?;
                Ok(row.as_ref().map(row_to_post_mysql))
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.slug = ?", POST_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get post by slug")?;
                Ok(row.as_ref().map(row_to_post_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get post by slug")?;
                Ok(row.as_ref().map(row_to_post_mysql))
            }
        }
    }

    async fn update(
        &self,
        post: &Post,
        tag_ids: Option<&[i64]>,
        like_ids: Option<&[i64]>,
    ) -> Result<Post> {
        let mut links = Vec::new();
        if let Some(ids) = tag_ids {
            links.push((Link::Tags, ids));
        }
        if let Some(ids) = like_ids {
            links.push((Link::Likes, ids));
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_post_sqlite(sqlite(&self.pool)?, post, &links).await?,
            DatabaseDriver::Mysql => update_post_mysql(mysql(&self.pool)?, post, &links).await?,
        }

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM posts WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to delete post")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to delete post")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn query(&self, query: &PostQuery) -> Result<Vec<PostEntry>> {
        let mut entries = match self.pool.driver() {
            DatabaseDriver::Sqlite => select_entries_sqlite(sqlite(&self.pool)?, query).await?,
            DatabaseDriver::Mysql => select_entries_mysql(mysql(&self.pool)?, query).await?,
        };
        if entries.is_empty() {
            return Ok(entries);
        }

        let post_ids: Vec<i64> = entries.iter().map(|e| e.post.id).collect();

        if query.prefetch_tags {
            let mut by_post: HashMap<i64, Vec<_>> = HashMap::new();
            for (post_id, tag) in self.tags.for_posts(&post_ids).await? {
                by_post.entry(post_id).or_default().push(tag);
            }
            for entry in &mut entries {
                entry.tags = Some(by_post.remove(&entry.post.id).unwrap_or_default());
            }
        }

        if query.with_comments_count {
            let counts = match self.pool.driver() {
                DatabaseDriver::Sqlite => {
                    comment_counts_sqlite(sqlite(&self.pool)?, &post_ids).await?
                }
                DatabaseDriver::Mysql => comment_counts_mysql(mysql(&self.pool)?, &post_ids).await?,
            };
            for entry in &mut entries {
                entry.comments_count = Some(counts.get(&entry.post.id).copied().unwrap_or(0));
            }
        }

        Ok(entries)
    }

    async fn count(&self, query: &PostQuery) -> Result<i64> {
        let (sql, binds) = count_sql(query);
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut q = sqlx::query(&sql);
                for value in &binds {
                    q = match *value {
                        BindValue::Int(v) => q.bind(v),
                        BindValue::Time(v) => q.bind(v),
                    };
                }
                q.fetch_one(sqlite(&self.pool)?)
                    .await
                    .context("Failed to count posts")?
                    .get("count")
            }
            DatabaseDriver::Mysql => {
                let mut q = sqlx::query(&sql);
                for value in &binds {
                    q = match *value {
                        BindValue::Int(v) => q.bind(v),
                        BindValue::Time(v) => q.bind(v),
                    };
                }
                q.fetch_one(mysql(&self.pool)?)
                    .await
                    .context("Failed to count posts")?
                    .get("count")
            }
        };
        Ok(count)
    }

    async fn tag_ids(&self, post_id: i64) -> Result<Vec<i64>> {
        let sql = "SELECT tag_id FROM post_tags WHERE post_id = ? ORDER BY tag_id";
        let ids = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(post_id)
                .fetch_all(sqlite(&self.pool)?)
                .await
                .context("Failed to get post tags")?
                .iter()
                .map(|row| row.get("tag_id"))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(post_id)
                .fetch_all(mysql(&self.pool)?)
                .await
                .context("Failed to get post tags")?
                .iter()
                .map(|row| row.get("tag_id"))
                .collect(),
        };
        Ok(ids)
    }

    async fn like_ids(&self, post_id: i64) -> Result<Vec<i64>> {
        let sql = "SELECT user_id FROM post_likes WHERE post_id = ? ORDER BY user_id";
        let ids = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(post_id)
                .fetch_all(sqlite(&self.pool)?)
                .await
                .context("Failed to get post likes")?
                .iter()
                .map(|row| row.get("user_id"))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(post_id)
                .fetch_all(mysql(&self.pool)?)
                .await
                .context("Failed to get post likes")?
                .iter()
                .map(|row| row.get("user_id"))
                .collect(),
        };
        Ok(ids)
    }

    async fn like(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?, ?)")
                    .bind(post_id)
                    .bind(user_id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to like post")?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                sqlx::query("INSERT IGNORE INTO post_likes (post_id, user_id) VALUES (?, ?)")
                    .bind(post_id)
                    .bind(user_id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to like post")?
                    .rows_affected()
            }
        };
        Ok(affected > 0)
    }

    async fn unlike(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let sql = "DELETE FROM post_likes WHERE post_id = ? AND user_id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(post_id)
                .bind(user_id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to unlike post")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(post_id)
                .bind(user_id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to unlike post")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn is_liked(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let sql = "SELECT COUNT(*) AS count FROM post_likes WHERE post_id = ? AND user_id = ?";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(post_id)
                .bind(user_id)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to check like")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(post_id)
                .bind(user_id)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to check like")?
                .get("count"),
        };
        Ok(count > 0)
    }

    async fn likes_count(&self, post_id: i64) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM post_likes WHERE post_id = ?";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(post_id)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count likes")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(post_id)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count likes")?
                .get("count"),
        };
        Ok(count)
    }
}

/// Many-to-many relations of a post
#[derive(Debug, Clone, Copy)]
enum Link {
    Tags,
    Likes,
}

impl Link {
    fn delete_sql(self) -> &'static str {
        match self {
            Link::Tags => "DELETE FROM post_tags WHERE post_id = ?",
            Link::Likes => "DELETE FROM post_likes WHERE post_id = ?",
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            Link::Tags => "INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)",
            Link::Likes => "INSERT INTO post_likes (post_id, user_id) VALUES (?, ?)",
        }
    }
}

const INSERT_POST_SQL: &str =
    "INSERT INTO posts (title, text, slug, image, published_at, author_id) VALUES (?, ?, ?, ?, ?, ?)";

const UPDATE_POST_SQL: &str = r#"
    UPDATE posts
    SET title = ?, text = ?, slug = ?, image = ?, published_at = ?, author_id = ?
    WHERE id = ?
"#;

/// Sorted, duplicate-free link targets
fn distinct(ids: &[i64]) -> BTreeSet<i64> {
    ids.iter().copied().collect()
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn select_entries_sqlite(pool: &SqlitePool, query: &PostQuery) -> Result<Vec<PostEntry>> {
    let (sql, binds) = select_sql(query);
    let mut q = sqlx::query(&sql);
    for value in &binds {
        q = match *value {
            BindValue::Int(v) => q.bind(v),
            BindValue::Time(v) => q.bind(v),
        };
    }
    let rows = q.fetch_all(pool).await.context("Failed to query posts")?;

    Ok(rows
        .iter()
        .map(|row| PostEntry::new(row_to_post_sqlite(row), row.get("likes_count")))
        .collect())
}

async fn comment_counts_sqlite(pool: &SqlitePool, post_ids: &[i64]) -> Result<HashMap<i64, i64>> {
    let sql = format!(
        "SELECT post_id, COUNT(*) AS count FROM comments WHERE post_id IN ({}) GROUP BY post_id",
        placeholders(post_ids.len())
    );
    let mut q = sqlx::query(&sql);
    for id in post_ids {
        q = q.bind(*id);
    }
    let rows = q.fetch_all(pool).await.context("Failed to count comments")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("post_id"), row.get("count")))
        .collect())
}

async fn insert_post_sqlite(pool: &SqlitePool, post: &Post, links: &[(Link, &[i64])]) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query(INSERT_POST_SQL)
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.slug)
        .bind(&post.image)
        .bind(post.published_at)
        .bind(post.author_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create post")?
        .last_insert_rowid();

    for (link, ids) in links {
        replace_links_sqlite(&mut tx, *link, id, ids).await?;
    }

    tx.commit().await.context("Failed to commit post")?;
    Ok(id)
}

async fn update_post_sqlite(pool: &SqlitePool, post: &Post, links: &[(Link, &[i64])]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let affected = sqlx::query(UPDATE_POST_SQL)
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.slug)
        .bind(&post.image)
        .bind(post.published_at)
        .bind(post.author_id)
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update post")?
        .rows_affected();
    if affected == 0 {
        anyhow::bail!("Post not found: {}", post.id);
    }

    for (link, ids) in links {
        replace_links_sqlite(&mut tx, *link, post.id, ids).await?;
    }

    tx.commit().await.context("Failed to commit post")?;
    Ok(())
}

async fn replace_links_sqlite(
    conn: &mut SqliteConnection,
    link: Link,
    post_id: i64,
    ids: &[i64],
) -> Result<()> {
    sqlx::query(link.delete_sql())
        .bind(post_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear post links")?;

    for id in distinct(ids) {
        sqlx::query(link.insert_sql())
            .bind(post_id)
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to link post")?;
    }
    Ok(())
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        slug: row.get("slug"),
        image: row.get("image"),
        published_at: row.get("published_at"),
        author_id: row.get("author_id"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn select_entries_mysql(pool: &MySqlPool, query: &PostQuery) -> Result<Vec<PostEntry>> {
    let (sql, binds) = select_sql(query);
    let mut q = sqlx::query(&sql);
    for value in &binds {
        q = match *value {
            BindValue::Int(v) => q.bind(v),
            BindValue::Time(v) => q.bind(v),
        };
    }
    let rows = q.fetch_all(pool).await.context("Failed to query posts")?;

    Ok(rows
        .iter()
        .map(|row| PostEntry::new(row_to_post_mysql(row), row.get("likes_count")))
        .collect())
}

async fn comment_counts_mysql(pool: &MySqlPool, post_ids: &[i64]) -> Result<HashMap<i64, i64>> {
    let sql = format!(
        "SELECT post_id, COUNT(*) AS count FROM comments WHERE post_id IN ({}) GROUP BY post_id",
        placeholders(post_ids.len())
    );
    let mut q = sqlx::query(&sql);
    for id in post_ids {
        q = q.bind(*id);
    }
    let rows = q.fetch_all(pool).await.context("Failed to count comments")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("post_id"), row.get("count")))
        .collect())
}

async fn insert_post_mysql(pool: &MySqlPool, post: &Post, links: &[(Link, &[i64])]) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query(INSERT_POST_SQL)
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.slug)
        .bind(&post.image)
        .bind(post.published_at)
        .bind(post.author_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create post")?
        .last_insert_id() as i64;

    for (link, ids) in links {
        replace_links_mysql(&mut tx, *link, id, ids).await?;
    }

    tx.commit().await.context("Failed to commit post")?;
    Ok(id)
}

async fn update_post_mysql(pool: &MySqlPool, post: &Post, links: &[(Link, &[i64])]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // MySQL reports matched rows as affected only when a value changed
    let exists = sqlx::query("SELECT id FROM posts WHERE id = ? FOR UPDATE")
        .bind(post.id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock post")?;
    if exists.is_none() {
        anyhow::bail!("Post not found: {}", post.id);
    }

    sqlx::query(UPDATE_POST_SQL)
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.slug)
        .bind(&post.image)
        .bind(post.published_at)
        .bind(post.author_id)
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update post")?;

    for (link, ids) in links {
        replace_links_mysql(&mut tx, *link, post.id, ids).await?;
    }

    tx.commit().await.context("Failed to commit post")?;
    Ok(())
}

async fn replace_links_mysql(
    conn: &mut MySqlConnection,
    link: Link,
    post_id: i64,
    ids: &[i64],
) -> Result<()> {
    sqlx::query(link.delete_sql())
        .bind(post_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear post links")?;

    for id in distinct(ids) {
        sqlx::query(link.insert_sql())
            .bind(post_id)
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to link post")?;
    }
    Ok(())
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        slug: row.get("slug"),
        image: row.get("image"),
        published_at: row.get("published_at"),
        author_id: row.get("author_id"),
    }
}
