//! Middleware for Web API.

pub mod auth;
pub mod cors;

pub use auth::{session_auth, AdminUser, AuthUser};
pub use cors::create_cors_layer;
