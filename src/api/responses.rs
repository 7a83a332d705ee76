//! Shared API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CommentWithMeta, PagedResult, Post, User};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            date_joined: user.date_joined.to_rfc3339(),
        }
    }
}

/// Response for successful authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

// ============================================================================
// Pagination
// ============================================================================

/// A page of items with pagination data
#[derive(Debug, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> From<PagedResult<T>> for PagedResponse<T> {
    fn from(result: PagedResult<T>) -> Self {
        let total_pages = result.total_pages();
        Self {
            items: result.items,
            total: result.total,
            page: result.page,
            per_page: result.per_page,
            total_pages,
        }
    }
}

// ============================================================================
// Admin rows
// ============================================================================

/// Post list row: title, author, published_at
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminPostRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
}

/// Comment list row: post, author, published_at
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminCommentRow {
    pub id: i64,
    pub post: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
}

impl From<CommentWithMeta> for AdminCommentRow {
    fn from(meta: CommentWithMeta) -> Self {
        Self {
            id: meta.comment.id,
            post: meta.post_title,
            author: meta.author_username,
            published_at: meta.comment.published_at,
        }
    }
}

/// Post edit form: every column plus raw ids for tags and likes
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminPostResponse {
    #[serde(flatten)]
    pub post: Post,
    pub tag_ids: Vec<i64>,
    pub like_ids: Vec<i64>,
}
