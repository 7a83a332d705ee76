//! Post API endpoints
//!
//! Public:
//! - GET /api/v1/posts - Paged listing (`year`, `order`, `tag` filters)
//! - GET /api/v1/posts/{slug} - Post detail with tags, comments and likes
//! - GET /api/v1/posts/{slug}/comments - Comments, oldest first
//!
//! Authenticated:
//! - POST /api/v1/posts/{slug}/like, DELETE /api/v1/posts/{slug}/like
//! - POST /api/v1/posts/{slug}/comments

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_page, default_page_size};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::PagedResponse;
use crate::models::{
    CommentWithMeta, CreateCommentInput, ListParams, PagedResult, Post, PostEntry, PostOrdering,
    PostQuery,
};
use crate::services::PostDetail;

/// Query parameters for the post listing
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub year: Option<i32>,
    /// `newest` (alias `fresh`), `chronological` or `popular`
    pub order: Option<PostOrdering>,
    /// Tag title
    pub tag: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub per_page: u32,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: i64,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{slug}", get(get_post))
        .route("/{slug}/comments", get(list_comments))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/{slug}/like", post(like_post).delete(unlike_post))
        .route("/{slug}/comments", post(create_comment))
}

/// GET /api/v1/posts
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PagedResponse<PostEntry>>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);

    let mut post_query = PostQuery::new().prefetch_tags().with_comments_count();
    if let Some(year) = query.year {
        post_query = post_query.year(year);
    }
    if let Some(order) = query.order {
        post_query = post_query.ordering(order);
    }
    if let Some(title) = query.tag.as_deref() {
        match state.tag_service.get_by_title(title).await? {
            Some(tag) => post_query = post_query.tagged(tag.id),
            None => return Ok(Json(PagedResult::new(Vec::new(), 0, &params).into())),
        }
    }

    let unfiltered = post_query.year.is_none() && post_query.tag_id.is_none();
    let page = if unfiltered && post_query.ordering == PostOrdering::Popular {
        state.post_service.popular(params).await?
    } else {
        state.post_service.list(post_query.paginate(params)).await?
    };

    Ok(Json(page.into()))
}

/// GET /api/v1/posts/{slug}
async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostDetail>, ApiError> {
    Ok(Json(state.post_service.detail(&slug).await?))
}

/// GET /api/v1/posts/{slug}/comments
async fn list_comments(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<CommentWithMeta>>, ApiError> {
    let post = find_post(&state, &slug).await?;
    Ok(Json(state.comment_service.list_for_post(post.id).await?))
}

/// POST /api/v1/posts/{slug}/comments
async fn create_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    Json(body): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_post(&state, &slug).await?;
    let comment = state
        .comment_service
        .create(CreateCommentInput::new(post.id, user.0.id, &body.text))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// POST /api/v1/posts/{slug}/like
async fn like_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let likes_count = state.post_service.like(&slug, user.0.id).await?;
    Ok(Json(LikeResponse {
        liked: true,
        likes_count,
    }))
}

/// DELETE /api/v1/posts/{slug}/like
async fn unlike_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let likes_count = state.post_service.unlike(&slug, user.0.id).await?;
    Ok(Json(LikeResponse {
        liked: false,
        likes_count,
    }))
}

async fn find_post(state: &AppState, slug: &str) -> Result<Post, ApiError> {
    state
        .post_service
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", slug)))
}
