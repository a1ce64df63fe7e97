//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::error::expose_error_details;
use super::handlers::{
    create_comment, create_post, delete_comment, delete_post, dislike_post, get_me, get_media,
    get_post, like_post, list_comments, list_my_posts, list_posts, list_published_posts,
    list_users, login, logout, my_likes, register, toggle_publish, update_post, update_profile,
    AppState,
};
use super::middleware::{create_cors_layer, session_auth};

/// Extra body allowance on top of the upload limit for multipart framing.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Router options taken from the web configuration.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
    /// Expose internal error causes in responses.
    pub debug_errors: bool,
}

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, options: &RouterOptions) -> Router {
    let user_routes = Router::new()
        .route("/", post(register).get(list_users))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", put(update_profile))
        .route("/me", get(get_me))
        .route("/me/likes", get(my_likes));

    let post_routes = Router::new()
        .route("/", post(create_post).get(list_posts))
        .route("/published", get(list_published_posts))
        .route("/mine", get(list_my_posts))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/:id/publish", patch(toggle_publish))
        .route("/:id/like", get(like_post))
        .route("/:id/dislike", get(dislike_post))
        .route("/:id/comments", post(create_comment).get(list_comments));

    let comment_routes = Router::new().route("/:id", delete(delete_comment));

    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/posts", post_routes)
        .nest("/comments", comment_routes);

    let keys = app_state.keys.clone();
    let body_limit = app_state.max_upload_size as usize + BODY_LIMIT_SLACK;

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/media/*key", get(get_media))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&options.cors_origins))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(move |req, next| {
                    let keys = keys.clone();
                    session_auth(keys, req, next)
                })),
        )
        .with_state(app_state);

    if options.debug_errors {
        router = router.layer(middleware::from_fn(expose_error_details));
    }

    router.merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
