//! Post handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::multipart::UploadForm;
use super::AppState;
use crate::blog::{PostDetails, PostEdit};
use crate::web::dto::{
    ApiResponse, CreatePostRequest, MessageResponse, PostResponse, PublishResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

type PostList = Json<ApiResponse<Vec<PostResponse>>>;

fn post_list(posts: Vec<PostDetails>) -> PostList {
    Json(ApiResponse::new(posts.into_iter().map(Into::into).collect()))
}

/// POST /api/posts - Create a post.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostResponse>>), ApiError> {
    let post = state
        .blog()
        .create_post(user.user_id(), &req.title, &req.category)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Post created successfully.",
            post.into(),
        )),
    ))
}

/// GET /api/posts - List all posts.
pub async fn list_posts(State(state): State<Arc<AppState>>) -> Result<PostList, ApiError> {
    Ok(post_list(state.blog().list_all().await?))
}

/// GET /api/posts/published - List published posts.
pub async fn list_published_posts(
    State(state): State<Arc<AppState>>,
) -> Result<PostList, ApiError> {
    Ok(post_list(state.blog().list_published().await?))
}

/// GET /api/posts/mine - List the caller's posts.
pub async fn list_my_posts(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<PostList, ApiError> {
    Ok(post_list(state.blog().list_by_author(user.user_id()).await?))
}

/// GET /api/posts/:id - Get a post.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let post = state.blog().get_post(id).await?;
    Ok(Json(ApiResponse::new(post.into())))
}

/// PUT /api/posts/:id - Update a post.
///
/// Request body: multipart/form-data with `title`, `subtitle`,
/// `description`, `category` and an optional `file` thumbnail.
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let form = UploadForm::read(multipart, state.max_upload_size).await?;

    let edit = PostEdit {
        title: form.text(&["title"]),
        subtitle: form.text(&["subtitle"]),
        description: form.text(&["description"]),
        category: form.text(&["category"]),
    };

    let post = state
        .blog()
        .update_post(id, user.user_id(), edit, form.file)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Post updated successfully",
        post.into(),
    )))
}

/// PATCH /api/posts/:id/publish - Toggle the publish flag.
pub async fn toggle_publish(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PublishResponse>>, ApiError> {
    let is_published = state.blog().toggle_publish(id, user.user_id()).await?;
    let message = if is_published {
        "Post is Published"
    } else {
        "Post is Unpublished"
    };

    Ok(Json(ApiResponse::with_message(
        message,
        PublishResponse { is_published },
    )))
}

/// DELETE /api/posts/:id - Delete a post with its comments and likes.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.blog().delete_post(id, user.user_id()).await?;
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}

/// GET /api/posts/:id/like - Like a post.
pub async fn like_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let post = state.blog().like(id, user.user_id()).await?;
    Ok(Json(ApiResponse::with_message("Post liked", post.into())))
}

/// GET /api/posts/:id/dislike - Remove a like.
pub async fn dislike_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let post = state.blog().unlike(id, user.user_id()).await?;
    Ok(Json(ApiResponse::with_message("Post disliked", post.into())))
}
