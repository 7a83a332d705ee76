//! Tag API endpoints
//!
//! - GET /api/v1/tags - Popular tags with post counts
//! - GET /api/v1/tags/{title}/posts - Posts carrying a tag, newest first

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::PagedResponse;
use crate::models::{PostEntry, PostQuery, TagWithCount};

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{title}/posts", get(list_tag_posts))
}

/// GET /api/v1/tags
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> Result<Json<Vec<TagWithCount>>, ApiError> {
    Ok(Json(state.tag_service.popular(query.limit).await?))
}

/// GET /api/v1/tags/{title}/posts
async fn list_tag_posts(
    State(state): State<AppState>,
    Path(title): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PagedResponse<PostEntry>>, ApiError> {
    let tag = state
        .tag_service
        .get_by_title(&title)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tag not found: {}", title)))?;

    let page = state
        .post_service
        .list(
            PostQuery::new()
                .tagged(tag.id)
                .prefetch_tags()
                .with_comments_count()
                .paginate(query.params()),
        )
        .await?;

    Ok(Json(page.into()))
}
