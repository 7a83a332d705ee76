//! API layer - HTTP handlers and routing
//!
//! Everything lives under `/api/v1`:
//! - Public post, tag and comment reads, registration and login
//! - Authenticated likes, comments, logout and `me`
//! - Staff-only admin API and image uploads
//!
//! Uploaded media is served from the configured URL prefix.

pub mod admin;
pub mod auth;
pub mod common;
pub mod middleware;
pub mod posts;
pub mod responses;
pub mod tags;
pub mod upload;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::cache::create_cache;
use crate::config::Config;
use crate::db::repositories::{
    SqlxCommentRepository, SqlxPostRepository, SqlxSessionRepository, SqlxTagRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{CommentService, PostService, TagService, UserService};

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Wire repositories, cache and services into the shared state
pub fn build_state(pool: DynDatabasePool, config: &Config) -> AppState {
    let cache = create_cache(&config.cache);

    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let tag_repo = SqlxTagRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());

    let user_service = Arc::new(UserService::with_session_expiration(
        user_repo.clone(),
        session_repo,
        config.session.expiration_days,
    ));
    let tag_service = Arc::new(TagService::new(tag_repo.clone(), cache.clone()));
    let post_service = Arc::new(PostService::new(
        post_repo.clone(),
        tag_repo,
        user_repo.clone(),
        comment_repo.clone(),
        cache.clone(),
    ));
    let comment_service = Arc::new(CommentService::new(comment_repo, post_repo, user_repo, cache));

    AppState {
        pool,
        user_service,
        post_service,
        tag_service,
        comment_service,
        media: Arc::new(config.media.clone()),
        session_days: config.session.expiration_days,
        request_stats: Arc::new(RequestStats::new()),
    }
}

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need staff)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .nest("/admin/uploads", upload::router(&state.media))
        .route_layer(axum_middleware::from_fn(middleware::require_staff))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not staff)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/posts", posts::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/posts", posts::public_router())
        .nest("/tags", tags::router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => tracing::warn!("Ignoring invalid CORS origin {:?}: {}", cors_origin, e),
    }

    let mut router = Router::new().nest("/api/v1", build_api_router(state.clone()));

    let prefix = format!("/{}", state.media.url_prefix.trim_matches('/'));
    if prefix.len() > 1 {
        router = router.nest_service(&prefix, ServeDir::new(&state.media.path));
    } else {
        tracing::warn!("Media URL prefix is empty, uploaded files will not be served");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateUserInput;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn setup() -> (Router, AppState, tempfile::TempDir) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let media = tempfile::tempdir().expect("Failed to create media dir");
        let mut config = Config::default();
        config.media.path = media.path().to_path_buf();

        let state = build_state(pool, &config);
        let app = build_router(state.clone(), "http://localhost:3000");
        (app, state, media)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }

    /// Register a user and return (token, body)
    async fn register(app: &Router, username: &str) -> (String, Value) {
        let response = send(
            app,
            request(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "password123"
                })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        (body["token"].as_str().unwrap().to_string(), body)
    }

    /// Create a staff superuser out of band and log in as them
    async fn superuser(app: &Router, state: &AppState, username: &str) -> (String, Value) {
        state
            .user_service
            .create_superuser(CreateUserInput::new(
                username.to_string(),
                format!("{}@example.com", username),
                "password123".to_string(),
            ))
            .await
            .expect("Failed to create superuser");

        let response = send(
            app,
            request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"username_or_email": username, "password": "password123"})),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        (body["token"].as_str().unwrap().to_string(), body)
    }

    /// Create a tag and a post as `token`, returning the post JSON
    async fn create_post(app: &Router, token: &str, author_id: i64, slug: &str) -> Value {
        let tag = send(
            app,
            request(
                "POST",
                "/api/v1/admin/tags",
                Some(token),
                Some(json!({"title": format!("Tag-{}", slug)})),
            ),
        )
        .await;
        assert_eq!(tag.status(), StatusCode::CREATED);
        let tag = json_body(tag).await;

        let post = send(
            app,
            request(
                "POST",
                "/api/v1/admin/posts",
                Some(token),
                Some(json!({
                    "title": "Hello world",
                    "text": "First post",
                    "slug": slug,
                    "image": "posts/cover.png",
                    "author_id": author_id,
                    "tag_ids": [tag["id"]]
                })),
            ),
        )
        .await;
        assert_eq!(post.status(), StatusCode::CREATED);
        json_body(post).await
    }

    #[tokio::test]
    async fn test_register_login_me_logout() {
        let (app, _, _media) = setup().await;

        let (token, body) = register(&app, "alice").await;
        assert_eq!(body["user"]["is_staff"], false);

        let login = send(
            &app,
            request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"username_or_email": "alice@example.com", "password": "password123"})),
            ),
        )
        .await;
        assert_eq!(login.status(), StatusCode::OK);
        assert!(login.headers().get(header::SET_COOKIE).is_some());

        let me = send(&app, request("GET", "/api/v1/auth/me", Some(&token), None)).await;
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(json_body(me).await["username"], "alice");

        let logout = send(&app, request("POST", "/api/v1/auth/logout", Some(&token), None)).await;
        assert_eq!(logout.status(), StatusCode::NO_CONTENT);

        let me = send(&app, request("GET", "/api/v1/auth/me", Some(&token), None)).await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_login_is_unauthorized() {
        let (app, _, _media) = setup().await;
        register(&app, "admin").await;

        let response = send(
            &app,
            request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"username_or_email": "admin", "password": "nope-nope"})),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_admin_requires_staff() {
        let (app, state, _media) = setup().await;
        let (first, _) = register(&app, "first").await;
        let (admin, _) = superuser(&app, &state, "admin").await;

        let anonymous = send(&app, request("GET", "/api/v1/admin/dashboard", None, None)).await;
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        // The first self-registered account is still a reader
        let forbidden = send(&app, request("GET", "/api/v1/admin/dashboard", Some(&first), None)).await;
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(forbidden).await["error"]["code"], "FORBIDDEN");

        let allowed = send(&app, request("GET", "/api/v1/admin/dashboard", Some(&admin), None)).await;
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_post_lifecycle() {
        let (app, state, _media) = setup().await;
        let (admin, body) = superuser(&app, &state, "admin").await;
        let admin_id = body["user"]["id"].as_i64().unwrap();
        let (reader, _) = register(&app, "reader").await;

        let post = create_post(&app, &admin, admin_id, "hello-world").await;
        assert_eq!(post["slug"], "hello-world");
        assert_eq!(post["tag_ids"].as_array().unwrap().len(), 1);

        let like = send(&app, request("POST", "/api/v1/posts/hello-world/like", Some(&reader), None)).await;
        assert_eq!(like.status(), StatusCode::OK);
        assert_eq!(json_body(like).await["likes_count"], 1);

        let comment = send(
            &app,
            request(
                "POST",
                "/api/v1/posts/hello-world/comments",
                Some(&reader),
                Some(json!({"text": "Nice"})),
            ),
        )
        .await;
        assert_eq!(comment.status(), StatusCode::CREATED);

        let detail = send(&app, request("GET", "/api/v1/posts/hello-world", None, None)).await;
        assert_eq!(detail.status(), StatusCode::OK);
        let detail = json_body(detail).await;
        assert_eq!(detail["likes_count"], 1);
        assert_eq!(detail["tags"][0]["title"], "tag-hello-world");
        assert_eq!(detail["comments"][0]["author_username"], "reader");

        let list = send(&app, request("GET", "/api/v1/posts?order=popular", None, None)).await;
        let list = json_body(list).await;
        assert_eq!(list["total"], 1);
        assert_eq!(list["items"][0]["comments_count"], 1);

        let by_tag = send(&app, request("GET", "/api/v1/tags/tag-hello-world/posts", None, None)).await;
        assert_eq!(json_body(by_tag).await["total"], 1);

        let rows = send(&app, request("GET", "/api/v1/admin/posts", Some(&admin), None)).await;
        assert_eq!(json_body(rows).await["items"][0]["author"], "admin");

        let id = post["id"].as_i64().unwrap();
        let deleted = send(&app, request("DELETE", &format!("/api/v1/admin/posts/{}", id), Some(&admin), None)).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let gone = send(&app, request("GET", "/api/v1/posts/hello-world", None, None)).await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(gone).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_year_out_of_range_is_rejected() {
        let (app, _, _media) = setup().await;

        let response = send(&app, request("GET", "/api/v1/posts?year=300000", None, None)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reader_cannot_author_posts() {
        let (app, state, _media) = setup().await;
        let (admin, _) = superuser(&app, &state, "admin").await;
        let (_, reader) = register(&app, "reader").await;
        let reader_id = reader["user"]["id"].as_i64().unwrap();

        let tag = send(&app, request("POST", "/api/v1/admin/tags", Some(&admin), Some(json!({"title": "rust"})))).await;
        let tag = json_body(tag).await;

        let response = send(
            &app,
            request(
                "POST",
                "/api/v1/admin/posts",
                Some(&admin),
                Some(json!({
                    "title": "Ghost",
                    "text": "Body",
                    "slug": "ghost",
                    "image": "posts/ghost.png",
                    "author_id": reader_id,
                    "tag_ids": [tag["id"]]
                })),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_duplicate_tag_conflicts() {
        let (app, state, _media) = setup().await;
        let (admin, _) = superuser(&app, &state, "admin").await;

        let first = send(&app, request("POST", "/api/v1/admin/tags", Some(&admin), Some(json!({"title": "Rust"})))).await;
        assert_eq!(first.status(), StatusCode::CREATED);
        assert_eq!(json_body(first).await["title"], "rust");

        let second = send(&app, request("POST", "/api/v1/admin/tags", Some(&admin), Some(json!({"title": "rust "})))).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let (app, state, _media) = setup().await;
        let (admin, body) = superuser(&app, &state, "admin").await;
        create_post(&app, &admin, body["user"]["id"].as_i64().unwrap(), "counted").await;

        let response = send(&app, request("GET", "/api/v1/admin/dashboard", Some(&admin), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let dashboard = json_body(response).await;
        assert_eq!(dashboard["total_posts"], 1);
        assert_eq!(dashboard["total_tags"], 1);
        assert_eq!(dashboard["total_users"], 1);
        assert!(dashboard["total_requests"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_upload_image_and_serve_it() {
        let (app, state, _media) = setup().await;
        let (admin, _) = superuser(&app, &state, "admin").await;

        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cover.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let upload = Request::builder()
            .method("POST")
            .uri("/api/v1/admin/uploads/image")
            .header(header::AUTHORIZATION, format!("Bearer {}", admin))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let response = send(&app, upload).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let uploaded = json_body(response).await;
        let url = uploaded["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/media/posts/"));

        let served = send(&app, request("GET", &url, None, None)).await;
        assert_eq!(served.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(served.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"PNGDATA");
    }
}
