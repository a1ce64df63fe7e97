//! Object storage for Quill.
//!
//! Media (avatars and post thumbnails) is written to an object store that
//! hands back a storage key and a public URL. The key is what the database
//! keeps for later deletion; the URL is what clients see.

mod local;
#[cfg(feature = "s3")]
mod s3;

pub use local::LocalObjectStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};
use crate::{QuillError, Result};

/// Key prefix for user avatars.
pub const AVATAR_PREFIX: &str = "avatars/";

/// Key prefix for post thumbnails.
pub const THUMBNAIL_PREFIX: &str = "thumbnails/";

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Storage key, used for deletion.
    pub key: String,
    /// Publicly reachable URL.
    pub url: String,
}

/// An object read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedObject {
    pub bytes: Vec<u8>,
    /// MIME type declared when the object was uploaded.
    pub content_type: String,
}

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl Upload {
    pub fn new(
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }

    /// Store this upload under `prefix`.
    pub async fn store(self, store: &dyn ObjectStore, prefix: &str) -> Result<StoredObject> {
        store
            .upload(self.bytes, &self.file_name, &self.content_type, prefix)
            .await
    }
}

/// Delete a replaced or orphaned object, logging instead of failing.
pub async fn discard(store: &dyn ObjectStore, key: &str) {
    if let Err(e) = store.delete(key).await {
        tracing::warn!(key = %key, error = %e, "failed to delete stale object");
    }
}

/// A binary object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under a freshly generated key beginning with `prefix`.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        original_name: &str,
        mime_type: &str,
        prefix: &str,
    ) -> Result<StoredObject>;

    /// Remove an object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Read an object back along with its stored content type.
    async fn load(&self, key: &str) -> Result<LoadedObject>;

    /// Public URL of a key.
    fn url_for(&self, key: &str) -> String;
}

/// Shared handle to the configured object store.
pub type SharedObjectStore = Arc<dyn ObjectStore>;

/// Generate a new object key: `{prefix}{uuid}{.ext}`.
///
/// The extension comes from the original file name, falling back to the
/// MIME type. Objects with neither get no extension.
pub fn generate_key(prefix: &str, original_name: &str, mime_type: &str) -> String {
    let uuid = Uuid::new_v4();
    match extension_for(original_name, mime_type) {
        Some(ext) => format!("{prefix}{uuid}.{ext}"),
        None => format!("{prefix}{uuid}"),
    }
}

fn extension_for(original_name: &str, mime_type: &str) -> Option<String> {
    let from_name = Path::new(original_name)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());

    from_name.or_else(|| {
        mime_guess::get_mime_extensions_str(mime_type)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    })
}

/// Content type to record for an upload. Blank types are guessed from the key.
pub(crate) fn content_type_for(key: &str, mime_type: &str) -> String {
    let mime_type = mime_type.trim();
    if mime_type.is_empty() {
        mime_guess::from_path(key).first_or_octet_stream().to_string()
    } else {
        mime_type.to_string()
    }
}

/// Reject keys that could escape the store.
pub(crate) fn check_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(QuillError::Validation(format!("invalid object key: {key}")));
    }
    Ok(())
}

/// Build the object store selected by the configuration.
pub async fn from_config(config: &StorageConfig) -> Result<SharedObjectStore> {
    match config.backend {
        StorageBackend::Local => {
            let store = LocalObjectStore::new(&config.path, &config.public_base_url)?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "s3")]
        StorageBackend::S3 => {
            let store = S3ObjectStore::from_env(&config.bucket, &config.region).await;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => Err(QuillError::Config(
            "storage backend 's3' requires building with the `s3` feature".to_string(),
        )),
    }
}
