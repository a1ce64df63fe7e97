//! Filesystem object store.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{check_key, content_type_for, generate_key, LoadedObject, ObjectStore, StoredObject};
use crate::{QuillError, Result};

/// Object store backed by a local directory.
///
/// Objects are stored in a sharded directory structure, keyed by the
/// first two characters of the file name:
/// ```text
/// {base_path}/
/// ├── avatars/
/// │   └── ab/
/// │       ├── ab12cd34-5678-90ab-cdef-123456789012.png
/// │       └── ab12cd34-5678-90ab-cdef-123456789012.png.meta
/// └── 9f/
///     ├── 9f0e1d2c-3b4a-5968-7a6b-5c4d3e2f1a0b.jpg
///     └── 9f0e1d2c-3b4a-5968-7a6b-5c4d3e2f1a0b.jpg.meta
/// ```
///
/// The `.meta` sidecar holds the content type declared at upload.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// Create a store rooted at `base_path`, serving objects under
    /// `public_base_url`.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: &str) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the full file path for a key.
    ///
    /// `{prefix}{name}` maps to `{base_path}/{prefix}{shard}/{name}` where
    /// shard is the first 2 characters of the name.
    pub fn file_path(&self, key: &str) -> PathBuf {
        let (dir, name) = match key.rsplit_once('/') {
            Some((dir, name)) => (Some(dir), name),
            None => (None, key),
        };
        let shard = name.get(..2).unwrap_or(name);

        let mut path = self.base_path.clone();
        if let Some(dir) = dir {
            path.push(dir);
        }
        path.push(shard);
        path.push(name);
        path
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        let mut path = self.file_path(key).into_os_string();
        path.push(META_SUFFIX);
        PathBuf::from(path)
    }

    /// Check if an object exists.
    pub async fn exists(&self, key: &str) -> bool {
        check_key(key).is_ok() && fs::try_exists(self.file_path(key)).await.unwrap_or(false)
    }
}

const META_SUFFIX: &str = ".meta";

fn storage_error(action: &str, key: &str, e: io::Error) -> QuillError {
    QuillError::Storage(format!("failed to {action} {key}: {e}"))
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        original_name: &str,
        mime_type: &str,
        prefix: &str,
    ) -> Result<StoredObject> {
        let key = generate_key(prefix, original_name, mime_type);
        let path = self.file_path(&key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create directory for", &key, e))?;
        }
        let content_type = content_type_for(&key, mime_type);
        fs::write(&path, &bytes)
            .await
            .map_err(|e| storage_error("write", &key, e))?;
        fs::write(self.meta_path(&key), content_type.as_bytes())
            .await
            .map_err(|e| storage_error("write metadata for", &key, e))?;

        debug!(key = %key, size = bytes.len(), mime = %content_type, "stored object");
        Ok(StoredObject {
            url: self.url_for(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        for path in [self.file_path(key), self.meta_path(key)] {
            match fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(storage_error("delete", key, e)),
            }
        }
        debug!(key = %key, "deleted object");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<LoadedObject> {
        check_key(key)?;
        let bytes = match fs::read(self.file_path(key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(QuillError::NotFound(format!("object {key}")));
            }
            Err(e) => return Err(storage_error("read", key, e)),
        };

        // Objects written without a sidecar fall back to the key's extension.
        let content_type = match fs::read_to_string(self.meta_path(key)).await {
            Ok(declared) => content_type_for(key, &declared),
            Err(e) if e.kind() == io::ErrorKind::NotFound => content_type_for(key, ""),
            Err(e) => return Err(storage_error("read metadata for", key, e)),
        };

        Ok(LoadedObject {
            bytes,
            content_type,
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
