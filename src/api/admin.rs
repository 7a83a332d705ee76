//! Admin API endpoints
//!
//! Staff-only management of posts, tags and comments. List endpoints return
//! the columns of the admin list screens; create and update bodies take raw
//! ids for authors, tags and likes.
//!
//! - GET /admin/dashboard
//! - GET|POST /admin/posts, GET|PUT|DELETE /admin/posts/{id}
//! - GET|POST /admin/tags, GET|PUT|DELETE /admin/tags/{id}
//! - GET|POST /admin/comments, GET|PUT|DELETE /admin/comments/{id}
//! - GET /admin/users - raw-id lookup

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::common::{default_admin_page_size, default_page, AdminPaginationQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{
    AdminCommentRow, AdminPostResponse, AdminPostRow, PagedResponse, UserResponse,
};
use crate::models::{
    CommentWithMeta, CreateCommentInput, CreatePostInput, ListParams, PostQuery, Tag, TagInput,
    TagWithCount, UpdateCommentInput, UpdatePostInput,
};

/// Response for dashboard stats
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub total_posts: i64,
    pub total_tags: i64,
    pub total_comments: i64,
    pub total_users: i64,
    pub database_ok: bool,
    pub total_requests: u64,
    pub avg_response_time_us: f64,
    pub uptime_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub staff: Option<bool>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_admin_page_size")]
    pub per_page: u32,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{id}", get(get_tag).put(update_tag).delete(delete_tag))
        .route("/comments", get(list_comments).post(create_comment))
        .route(
            "/comments/{id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/users", get(list_users))
}

/// GET /api/v1/admin/dashboard
async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    Ok(Json(DashboardResponse {
        total_posts: state.post_service.count().await?,
        total_tags: state.tag_service.count().await?,
        total_comments: state.comment_service.count().await?,
        total_users: state.user_service.count().await?,
        database_ok: state.pool.ping().await.is_ok(),
        total_requests: state.request_stats.total_requests(),
        avg_response_time_us: state.request_stats.avg_response_time_us(),
        uptime_seconds: state.request_stats.uptime_seconds(),
    }))
}

// ============================================================================
// Posts
// ============================================================================

/// GET /api/v1/admin/posts
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<AdminPaginationQuery>,
) -> Result<Json<PagedResponse<AdminPostRow>>, ApiError> {
    let page = state
        .post_service
        .list(PostQuery::new().paginate(query.params()))
        .await?;

    let mut authors: HashMap<i64, String> = HashMap::new();
    for entry in &page.items {
        let id = entry.post.author_id;
        if authors.contains_key(&id) {
            continue;
        }
        let name = state
            .user_service
            .get_by_id(id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();
        authors.insert(id, name);
    }

    let rows = page.map(|entry| AdminPostRow {
        id: entry.post.id,
        title: entry.post.title,
        author: authors.get(&entry.post.author_id).cloned().unwrap_or_default(),
        published_at: entry.post.published_at,
    });
    Ok(Json(rows.into()))
}

/// POST /api/v1/admin/posts
async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.post_service.create(body).await?;
    let response = post_response(&state, post.id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/admin/posts/{id}
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AdminPostResponse>, ApiError> {
    Ok(Json(post_response(&state, id).await?))
}

/// PUT /api/v1/admin/posts/{id}
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<Json<AdminPostResponse>, ApiError> {
    state.post_service.update(id, body).await?;
    Ok(Json(post_response(&state, id).await?))
}

/// DELETE /api/v1/admin/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn post_response(state: &AppState, id: i64) -> Result<AdminPostResponse, ApiError> {
    let post = state
        .post_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", id)))?;
    let (tag_ids, like_ids) = state.post_service.relations(id).await?;
    Ok(AdminPostResponse {
        post,
        tag_ids,
        like_ids,
    })
}

// ============================================================================
// Tags
// ============================================================================

/// GET /api/v1/admin/tags
async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagWithCount>>, ApiError> {
    Ok(Json(state.tag_service.list().await?))
}

/// POST /api/v1/admin/tags
async fn create_tag(
    State(state): State<AppState>,
    Json(body): Json<TagInput>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.tag_service.create(&body.title).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// GET /api/v1/admin/tags/{id}
async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Tag>, ApiError> {
    state
        .tag_service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Tag not found: {}", id)))
}

/// PUT /api/v1/admin/tags/{id}
async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<TagInput>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.tag_service.update(id, &body.title).await?))
}

/// DELETE /api/v1/admin/tags/{id}
async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Comments
// ============================================================================

/// GET /api/v1/admin/comments
async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<AdminPaginationQuery>,
) -> Result<Json<PagedResponse<AdminCommentRow>>, ApiError> {
    let page = state.comment_service.list(&query.params()).await?;
    Ok(Json(page.map(AdminCommentRow::from).into()))
}

/// POST /api/v1/admin/comments
async fn create_comment(
    State(state): State<AppState>,
    Json(body): Json<CreateCommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.comment_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/v1/admin/comments/{id}
async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CommentWithMeta>, ApiError> {
    state
        .comment_service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Comment not found: {}", id)))
}

/// PUT /api/v1/admin/comments/{id}
async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCommentInput>,
) -> Result<Json<CommentWithMeta>, ApiError> {
    Ok(Json(state.comment_service.update(id, body).await?))
}

/// DELETE /api/v1/admin/comments/{id}
async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Users
// ============================================================================

/// GET /api/v1/admin/users
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<PagedResponse<UserResponse>>, ApiError> {
    let page = state
        .user_service
        .list(query.staff, &ListParams::new(query.page, query.per_page))
        .await?;
    Ok(Json(page.map(UserResponse::from).into()))
}
