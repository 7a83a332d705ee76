//! API middleware
//!
//! Contains middleware for:
//! - Authentication (session token validation)
//! - Authorization (staff gate for the admin API)
//! - Request statistics
//!
//! It also holds the shared [`AppState`] and the JSON [`ApiError`] every
//! handler returns.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::MediaConfig;
use crate::models::User;
use crate::services::{
    CommentService, CommentServiceError, PostService, PostServiceError, TagService,
    TagServiceError, UserService, UserServiceError,
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Total response time in microseconds (for calculating average)
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub tag_service: Arc<TagService>,
    pub comment_service: Arc<CommentService>,
    pub media: Arc<MediaConfig>,
    /// Session lifetime, used for the cookie's Max-Age
    pub session_days: i64,
    pub request_stats: Arc<RequestStats>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and hide it from the client
    fn internal(error: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", error);
        Self::internal_error("Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<PostServiceError> for ApiError {
    fn from(e: PostServiceError) -> Self {
        match e {
            PostServiceError::NotFound(slug) => Self::not_found(format!("Post not found: {}", slug)),
            PostServiceError::ValidationError(msg) => Self::validation_error(msg),
            PostServiceError::Conflict(slug) => Self::with_details(
                "CONFLICT",
                format!("Post with slug '{}' already exists", slug),
                serde_json::json!({ "field": "slug", "value": slug }),
            ),
            PostServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<TagServiceError> for ApiError {
    fn from(e: TagServiceError) -> Self {
        match e {
            TagServiceError::NotFound(id) => Self::not_found(format!("Tag not found: {}", id)),
            TagServiceError::ValidationError(msg) => Self::validation_error(msg),
            TagServiceError::Conflict(title) => Self::with_details(
                "CONFLICT",
                format!("Tag '{}' already exists", title),
                serde_json::json!({ "field": "title", "value": title }),
            ),
            TagServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NotFound(id) => {
                Self::not_found(format!("Comment not found: {}", id))
            }
            CommentServiceError::ValidationError(msg) => Self::validation_error(msg),
            CommentServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => Self::unauthorized(msg),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::UserExists(msg) => Self::conflict(msg),
            UserServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Extract session token from the `Authorization: Bearer` header or the
/// session cookie. The header wins when both are present.
pub fn extract_session_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|cookie| {
        let (name, value) = cookie.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Staff authorization middleware, layered inside [`require_auth`]
pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.can_access_admin() {
        return Err(ApiError::forbidden("Staff privileges required"));
    }

    Ok(next.run(request).await)
}

/// Request statistics middleware
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state
        .request_stats
        .record(start.elapsed().as_micros() as u64);
    response
}
