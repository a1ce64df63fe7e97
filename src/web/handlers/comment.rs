//! Comment handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::{ApiResponse, CommentRequest, CommentResponse, MessageResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/posts/:id/comments - Comment on a post.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(post_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponse>>), ApiError> {
    let comment = state
        .blog()
        .add_comment(post_id, user.user_id(), &req.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Comment added", comment.into())),
    ))
}

/// GET /api/posts/:id/comments - List the comments of a post.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, ApiError> {
    let comments = state.blog().list_comments(post_id).await?;
    Ok(Json(ApiResponse::new(
        comments.into_iter().map(Into::into).collect(),
    )))
}

/// DELETE /api/comments/:id - Delete a comment.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.blog().delete_comment(id, user.user_id()).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
