//! User handlers.

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use super::multipart::UploadForm;
use super::AppState;
use crate::auth::{self, ProfileUpdateRequest};
use crate::web::dto::{ApiResponse, LikesSummaryResponse, UserListResponse, UserResponse};
use crate::web::error::ApiError;
use crate::web::middleware::{AdminUser, AuthUser};

/// GET /api/users/me - Get the current user's profile.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let profile = auth::get_profile(&state.db, user.user_id()).await?;
    Ok(Json(ApiResponse::new(profile.into())))
}

/// PUT /api/users/profile - Update the current user's profile.
///
/// Request body: multipart/form-data with text fields and an optional
/// `file` avatar.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let form = UploadForm::read(multipart, state.max_upload_size).await?;

    let request = ProfileUpdateRequest {
        first_name: form.text(&["first_name", "firstName"]),
        last_name: form.text(&["last_name", "lastName"]),
        bio: form.text(&["bio"]),
        occupation: form.text(&["occupation"]),
        instagram: form.text(&["instagram"]),
        facebook: form.text(&["facebook"]),
        linkedin: form.text(&["linkedin"]),
        github: form.text(&["github"]),
    };

    let updated = auth::update_profile(
        &state.db,
        state.store.as_ref(),
        user.user_id(),
        request,
        form.file,
    )
    .await?;

    Ok(Json(ApiResponse::with_message(
        "Profile updated successfully",
        updated.into(),
    )))
}

/// GET /api/users - List all users (admin only).
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<UserListResponse>>, ApiError> {
    let users: Vec<UserResponse> = auth::list_users(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = users.len();

    Ok(Json(ApiResponse::new(UserListResponse { users, total })))
}

/// GET /api/users/me/likes - Aggregate likes across the caller's posts.
pub async fn my_likes(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<LikesSummaryResponse>>, ApiError> {
    let summary = state.blog().likes_summary(user.user_id()).await?;
    Ok(Json(ApiResponse::new(summary.into())))
}
