//! Upload API endpoints
//!
//! - POST /api/v1/admin/uploads/image - Upload a post image (staff only)
//!
//! Files land in the media directory under a random name and are served
//! from the media URL prefix. The returned `path` is what goes into a
//! post's `image` field.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::config::MediaConfig;

/// Response for successful upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Media-relative path, stored in `Post::image`
    pub path: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

/// Multipart overhead allowed on top of the file size limit
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn router(media: &MediaConfig) -> Router<AppState> {
    let limit = media.max_file_size.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/image", post(upload_image))
        .layer(DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX)))
}

/// POST /api/v1/admin/uploads/image
///
/// Accepts multipart/form-data with a single file field named "file".
async fn upload_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let config = &state.media;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !config.is_type_allowed(&content_type) {
            return Err(ApiError::validation_error(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                content_type, config.allowed_types
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        if data.is_empty() {
            return Err(ApiError::validation_error("File is empty"));
        }
        if data.len() as u64 > config.max_file_size {
            return Err(ApiError::validation_error(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                config.max_file_size,
                config.max_file_size / 1024 / 1024
            )));
        }

        let path = store_image(config, &content_type, &data).await?;
        tracing::info!("{} uploaded {} ({} bytes)", user.0.username, path, data.len());

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: config.url_for(&path),
                path,
                size: data.len() as u64,
                content_type,
            }),
        ));
    }

    Err(ApiError::validation_error("No file provided"))
}

/// Write an image under `posts/` in the media directory and return its
/// media-relative path
async fn store_image(config: &MediaConfig, content_type: &str, data: &[u8]) -> Result<String, ApiError> {
    let dir = config.path.join("posts");
    ensure_dir(&dir).await?;

    let filename = format!("{}.{}", Uuid::new_v4(), config.get_extension(content_type));
    fs::write(dir.join(&filename), data)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

    Ok(format!("posts/{}", filename))
}

async fn ensure_dir(path: &Path) -> Result<(), ApiError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create media dir: {}", e)))
}
