//! Session authentication middleware.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{
        header::AUTHORIZATION,
        request::Parts,
        Request,
    },
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::auth::{Claims, SessionKeys, SESSION_COOKIE};
use crate::web::error::ApiError;

/// Extractor for authenticated users.
///
/// The session token is read from the `token` cookie, falling back to an
/// `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// ID of the authenticated user.
    pub fn user_id(&self) -> i64 {
        self.0.sub
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)
            .ok_or_else(|| ApiError::unauthorized("Not authorized, please login"))?;

        // Set by `session_auth`
        let keys = parts
            .extensions
            .get::<Arc<SessionKeys>>()
            .ok_or_else(|| ApiError::internal("Session keys not configured"))?;

        let claims = keys
            .verify(&token)
            .map_err(|_| ApiError::unauthorized("Invalid or expired session"))?;

        Ok(AuthUser(claims))
    }
}

/// Extractor for authenticated administrators.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(AdminUser(claims))
    }
}

fn session_token(parts: &Parts) -> Option<String> {
    cookie_token(parts).or_else(|| {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

fn cookie_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Middleware function to inject the session keys into request extensions.
pub async fn session_auth(
    keys: Arc<SessionKeys>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(keys);
    next.run(request).await
}
