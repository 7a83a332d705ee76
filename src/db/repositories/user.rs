//! User repository
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get the first user registered with `email`
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user, cascading to their posts, comments, likes and sessions
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    /// List users by username, optionally only staff or only non-staff
    async fn list(&self, staff: Option<bool>, page: i64, per_page: i64) -> Result<(Vec<User>, i64)>;

    /// IDs among `ids` that belong to existing users
    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(sqlite(&self.pool)?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(mysql(&self.pool)?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get user by ID")?;
                Ok(row.as_ref().map(row_to_user_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get user by ID")?;
                Ok(row.as_ref().map(row_to_user_mysql))
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(username)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get user by username")?;
                Ok(row.as_ref().map(row_to_user_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(username)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get user by username")?;
                Ok(row.as_ref().map(row_to_user_mysql))
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = ? ORDER BY id LIMIT 1",
            USER_COLUMNS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get user by email")?;
                Ok(row.as_ref().map(row_to_user_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get user by email")?;
                Ok(row.as_ref().map(row_to_user_mysql))
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(sqlite(&self.pool)?, user).await?,
            DatabaseDriver::Mysql => update_user_mysql(mysql(&self.pool)?, user).await?,
        }
        self.get_by_id(user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM users WHERE id = ?")
                    .bind(id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to delete user")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM users WHERE id = ?")
                    .bind(id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to delete user")?;
            }
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_users_sqlite(sqlite(&self.pool)?, None).await,
            DatabaseDriver::Mysql => count_users_mysql(mysql(&self.pool)?, None).await,
        }
    }

    async fn list(&self, staff: Option<bool>, page: i64, per_page: i64) -> Result<(Vec<User>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_users_sqlite(sqlite(&self.pool)?, staff, page, per_page).await
            }
            DatabaseDriver::Mysql => list_users_mysql(mysql(&self.pool)?, staff, page, per_page).await,
        }
    }

    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id FROM users WHERE id IN ({}) ORDER BY id",
            super::placeholders(ids.len())
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
                    .context("Failed to look up user IDs")?;
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
                    .context("Failed to look up user IDs")?;
                Ok(rows.iter().map(|row| row.get("id")).collect())
            }
        }
    }
}

fn staff_filter(staff: Option<bool>) -> &'static str {
    match staff {
        Some(true) => " WHERE is_staff = TRUE",
        Some(false) => " WHERE is_staff = FALSE",
        None => "",
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        date_joined: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, is_staff = ?, is_superuser = ?, is_active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(Utc::now())
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(())
}

async fn count_users_sqlite(pool: &SqlitePool, staff: Option<bool>) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) as count FROM users{}", staff_filter(staff));
    let row = sqlx::query(&sql)
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

async fn list_users_sqlite(
    pool: &SqlitePool,
    staff: Option<bool>,
    page: i64,
    per_page: i64,
) -> Result<(Vec<User>, i64)> {
    let offset = (page - 1).max(0) * per_page;
    let sql = format!(
        "SELECT {} FROM users{} ORDER BY username LIMIT ? OFFSET ?",
        USER_COLUMNS,
        staff_filter(staff)
    );

    let rows = sqlx::query(&sql)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let users = rows.iter().map(row_to_user_sqlite).collect();
    let total = count_users_sqlite(pool, staff).await?;

    Ok((users, total))
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        date_joined: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, is_staff = ?, is_superuser = ?, is_active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(Utc::now())
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(())
}

async fn count_users_mysql(pool: &MySqlPool, staff: Option<bool>) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) as count FROM users{}", staff_filter(staff));
    let row = sqlx::query(&sql)
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

async fn list_users_mysql(
    pool: &MySqlPool,
    staff: Option<bool>,
    page: i64,
    per_page: i64,
) -> Result<(Vec<User>, i64)> {
    let offset = (page - 1).max(0) * per_page;
    let sql = format!(
        "SELECT {} FROM users{} ORDER BY username LIMIT ? OFFSET ?",
        USER_COLUMNS,
        staff_filter(staff)
    );

    let rows = sqlx::query(&sql)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let users = rows.iter().map(row_to_user_mysql).collect();
    let total = count_users_mysql(pool, staff).await?;

    Ok((users, total))
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
        updated_at: row.get("updated_at"),
    }
}
