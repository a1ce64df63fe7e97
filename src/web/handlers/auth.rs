//! Registration and session handlers.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use super::AppState;
use crate::auth::{self, clear_session_cookie, session_cookie, RegistrationRequest};
use crate::web::dto::{
    ApiResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse, ValidatedJson,
};
use crate::web::error::ApiError;

/// POST /api/users - Register a new account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let request = RegistrationRequest::new(req.first_name, req.last_name, req.email, req.password);
    auth::register(&state.db, &state.admin, state.notifier.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Account Created Successfully")),
    ))
}

/// POST /api/users/login - Log in and receive the session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<UserResponse>>), ApiError> {
    let outcome = auth::login(&state.db, &state.keys, &req.email, &req.password).await?;

    let cookie = session_cookie(outcome.token, state.keys.expiry_secs(), state.secure_cookie);
    let message = format!("Welcome back {}", outcome.user.first_name);

    Ok((
        jar.add(cookie),
        Json(ApiResponse::with_message(message, outcome.user.into())),
    ))
}

/// POST /api/users/logout - Clear the session cookie.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(clear_session_cookie()),
        Json(MessageResponse::new("Logged out successfully.")),
    )
}
