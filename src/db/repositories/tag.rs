//! Tag repository
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite and MySQL
//!
//! Post counts are computed with a `LEFT JOIN` on `post_tags`, so tags
//! without posts are reported with a count of zero.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::{Tag, TagWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::placeholders;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, title: &str) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by exact title
    async fn get_by_title(&self, title: &str) -> Result<Option<Tag>>;

    /// Rename a tag
    async fn update(&self, id: i64, title: &str) -> Result<Option<Tag>>;

    /// Delete a tag and its post links
    async fn delete(&self, id: i64) -> Result<bool>;

    /// All tags ordered by title, with post counts
    async fn list(&self) -> Result<Vec<TagWithCount>>;

    /// Count total tags
    async fn count(&self) -> Result<i64>;

    /// Tags ordered by post count descending, then title
    async fn popular(&self, limit: i64) -> Result<Vec<TagWithCount>>;

    /// Tags of each given post, ordered by title, as `(post_id, tag)` pairs
    async fn for_posts(&self, post_ids: &[i64]) -> Result<Vec<(i64, TagWithCount)>>;

    /// IDs among `ids` that belong to existing tags
    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

const TAG_WITH_COUNT_SELECT: &str = r#"
    SELECT t.id, t.title, COUNT(pt.post_id) AS posts_count
    FROM tags t
    LEFT JOIN post_tags pt ON pt.tag_id = t.id
"#;

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, title: &str) -> Result<Tag> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("INSERT INTO tags (title) VALUES (?)")
                .bind(title)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to create tag")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query("INSERT INTO tags (title) VALUES (?)")
                .bind(title)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to create tag")?
                .last_insert_id() as i64,
        };

        Ok(Tag {
            id,
            title: title.to_string(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_sqlite(sqlite(&self.pool)?, TagKey::Id(id)).await,
            DatabaseDriver::Mysql => get_tag_mysql(mysql(&self.pool)?, TagKey::Id(id)).await,
        }
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_sqlite(sqlite(&self.pool)?, TagKey::Title(title)).await,
            DatabaseDriver::Mysql => get_tag_mysql(mysql(&self.pool)?, TagKey::Title(title)).await,
        }
    }

    async fn update(&self, id: i64, title: &str) -> Result<Option<Tag>> {
        let sql = "UPDATE tags SET title = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql).bind(title).bind(id).execute(sqlite(&self.pool)?).await
                    .context("Failed to update tag")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql).bind(title).bind(id).execute(mysql(&self.pool)?).await
                    .context("Failed to update tag")?;
            }
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM tags WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to delete tag")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to delete tag")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn list(&self) -> Result<Vec<TagWithCount>> {
        let sql = format!("{} GROUP BY t.id, t.title ORDER BY t.title", TAG_WITH_COUNT_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context("Failed to list tags")?;
                Ok(rows.iter().map(row_to_tag_with_count_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context("Failed to list tags")?;
                Ok(rows.iter().map(row_to_tag_with_count_mysql).collect())
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM tags";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count tags")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count tags")?
                .get("count"),
        };
        Ok(count)
    }

    async fn popular(&self, limit: i64) -> Result<Vec<TagWithCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => popular_tags_sqlite(sqlite(&self.pool)?, limit).await,
            DatabaseDriver::Mysql => popular_tags_mysql(mysql(&self.pool)?, limit).await,
        }
    }

    async fn for_posts(&self, post_ids: &[i64]) -> Result<Vec<(i64, TagWithCount)>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => tags_for_posts_sqlite(sqlite(&self.pool)?, post_ids).await,
            DatabaseDriver::Mysql => tags_for_posts_mysql(mysql(&self.pool)?, post_ids).await,
        }
    }

    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id FROM tags WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut query = sqlx::query(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                let rows = query
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context("Failed to look up tag IDs")?;
                Ok(rows.iter().map(|row| row.get("id")).collect())
            }
            DatabaseDriver::Mysql => {
                let mut query = sqlx::query(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                let rows = query
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context("Failed to look up tag IDs")?;
                Ok(rows.iter().map(|row| row.get("id")).collect())
            }
        }
    }
}

enum TagKey<'a> {
    Id(i64),
    Title(&'a str),
}

/// Post count per tag, used as a derived table by the per-post tag lookup
const TAG_COUNTS_SUBQUERY: &str =
    "(SELECT tag_id, COUNT(*) AS posts_count FROM post_tags GROUP BY tag_id)";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_tag_sqlite(pool: &SqlitePool, key: TagKey<'_>) -> Result<Option<Tag>> {
    let query = match key {
        TagKey::Id(id) => sqlx::query("SELECT id, title FROM tags WHERE id = ?").bind(id),
        TagKey::Title(title) => sqlx::query("SELECT id, title FROM tags WHERE title = ?").bind(title),
    };
    let row = query
        .fetch_optional(pool)
        .await
        .context("Failed to get tag")?;

    Ok(row.map(|row| Tag {
        id: row.get("id"),
        title: row.get("title"),
    }))
}

async fn popular_tags_sqlite(pool: &SqlitePool, limit: i64) -> Result<Vec<TagWithCount>> {
    let sql = format!(
        "{} GROUP BY t.id, t.title ORDER BY posts_count DESC, t.title ASC LIMIT ?",
        TAG_WITH_COUNT_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to get popular tags")?;

    Ok(rows.iter().map(row_to_tag_with_count_sqlite).collect())
}

async fn tags_for_posts_sqlite(
    pool: &SqlitePool,
    post_ids: &[i64],
) -> Result<Vec<(i64, TagWithCount)>> {
    let sql = format!(
        r#"
        SELECT pt.post_id, t.id, t.title, c.posts_count
        FROM post_tags pt
        INNER JOIN tags t ON t.id = pt.tag_id
        INNER JOIN {} c ON c.tag_id = t.id
        WHERE pt.post_id IN ({})
        ORDER BY t.title ASC
        "#,
        TAG_COUNTS_SUBQUERY,
        placeholders(post_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in post_ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get tags for posts")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("post_id"), row_to_tag_with_count_sqlite(row)))
        .collect())
}

fn row_to_tag_with_count_sqlite(row: &sqlx::sqlite::SqliteRow) -> TagWithCount {
    TagWithCount::new(
        Tag {
            id: row.get("id"),
            title: row.get("title"),
        },
        row.get("posts_count"),
    )
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_tag_mysql(pool: &MySqlPool, key: TagKey<'_>) -> Result<Option<Tag>> {
    let query = match key {
        TagKey::Id(id) => sqlx::query("SELECT id, title FROM tags WHERE id = ?").bind(id),
        TagKey::Title(title) => sqlx::query("SELECT id, title FROM tags WHERE title = ?").bind(title),
    };
    let row = query
        .fetch_optional(pool)
        .await
        .context("Failed to get tag")?;

    Ok(row.map(|row| Tag {
        id: row.get("id"),
        title: row.get("title"),
    }))
}

async fn popular_tags_mysql(pool: &MySqlPool, limit: i64) -> Result<Vec<TagWithCount>> {
    let sql = format!(
        "{} GROUP BY t.id, t.title ORDER BY posts_count DESC, t.title ASC LIMIT ?",
        TAG_WITH_COUNT_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to get popular tags")?;

    Ok(rows.iter().map(row_to_tag_with_count_mysql).collect())
}

async fn tags_for_posts_mysql(
    pool: &MySqlPool,
    post_ids: &[i64],
) -> Result<Vec<(i64, TagWithCount)>> {
    let sql = format!(
        r#"
        SELECT pt.post_id, t.id, t.title, c.posts_count
        FROM post_tags pt
        INNER JOIN tags t ON t.id = pt.tag_id
        INNER JOIN {} c ON c.tag_id = t.id
        WHERE pt.post_id IN ({})
        ORDER BY t.title ASC
        "#,
        TAG_COUNTS_SUBQUERY,
        placeholders(post_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in post_ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get tags for posts")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("post_id"), row_to_tag_with_count_mysql(row)))
        .collect())
}

fn row_to_tag_with_count_mysql(row: &sqlx::mysql::MySqlRow) -> TagWithCount {
    TagWithCount::new(
        Tag {
            id: row.get("id"),
            title: row.get("title"),
        },
        row.get("posts_count"),
    )
}
