//! API handlers for the Quill web API.

pub mod auth;
pub mod comment;
pub mod media;
mod multipart;
pub mod post;
pub mod user;

pub use auth::*;
pub use comment::*;
pub use media::*;
pub use post::*;
pub use user::*;

use std::sync::Arc;

use crate::auth::SessionKeys;
use crate::blog::BlogService;
use crate::config::AdminConfig;
use crate::notify::SharedNotifier;
use crate::storage::SharedObjectStore;
use crate::Database;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Default maximum upload size (5 MB).
const DEFAULT_MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024;

/// Application state shared by all handlers.
pub struct AppState {
    /// Database handle.
    pub db: SharedDatabase,
    /// Object store for avatars and thumbnails.
    pub store: SharedObjectStore,
    /// Signup notifier, if any.
    pub notifier: Option<SharedNotifier>,
    /// Session signing keys.
    pub keys: Arc<SessionKeys>,
    /// Administrator emails.
    pub admin: AdminConfig,
    /// Mark session cookies `Secure`.
    pub secure_cookie: bool,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: SharedDatabase, store: SharedObjectStore, keys: Arc<SessionKeys>) -> Self {
        Self {
            db,
            store,
            notifier: None,
            keys,
            admin: AdminConfig::default(),
            secure_cookie: false,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Set the signup notifier.
    pub fn with_notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the administrator configuration.
    pub fn with_admin(mut self, admin: AdminConfig) -> Self {
        self.admin = admin;
        self
    }

    /// Mark session cookies `Secure`.
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    /// Set the maximum upload size in megabytes.
    pub fn with_max_upload_size_mb(mut self, mb: u64) -> Self {
        self.max_upload_size = mb * 1024 * 1024;
        self
    }

    /// Blog service bound to this state's database and store.
    pub fn blog(&self) -> BlogService<'_> {
        BlogService::new(&self.db, self.store.as_ref())
    }
}
