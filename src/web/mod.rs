//! Web API module for Quill.
//!
//! A JSON API over HTTP: accounts and sessions, posts with likes and
//! comments, and media uploads served back from the object store.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_router, RouterOptions};
pub use server::WebServer;
