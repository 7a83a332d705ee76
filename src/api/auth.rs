//! Authentication API endpoints
//!
//! - POST /api/v1/auth/register - Register a reader account
//! - POST /api/v1/auth/login - Log in by username or email
//! - POST /api/v1/auth/logout - Log out
//! - GET /api/v1/auth/me - Current user

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{clear_session_cookie, session_cookie};
use crate::api::middleware::{extract_session_token, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{AuthResponse, UserResponse};
use crate::models::CreateUserInput;

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_service
        .register(CreateUserInput::new(body.username, body.email, body.password.clone()))
        .await?;

    let (session, user) = state.user_service.login(&user.username, &body.password).await?;

    Ok((
        StatusCode::CREATED,
        session_cookie(&session.id, state.session_days),
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, user) = state
        .user_service
        .login(&body.username_or_email, &body.password)
        .await?;

    tracing::debug!("User {} logged in", user.username);

    Ok((
        session_cookie(&session.id, state.session_days),
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.user_service.logout(&token).await?;

    Ok((StatusCode::NO_CONTENT, clear_session_cookie()))
}

/// GET /api/v1/auth/me
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}
