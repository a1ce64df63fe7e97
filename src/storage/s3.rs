//! AWS S3 object store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{check_key, content_type_for, generate_key, LoadedObject, ObjectStore, StoredObject};
use crate::{QuillError, Result};

/// Object store backed by an S3 bucket.
///
/// Credentials come from the standard AWS environment chain.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    /// Create a store from an existing client.
    pub fn new(client: Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Create a store using credentials from the environment.
    pub async fn from_env(bucket: &str, region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config), bucket, region)
    }
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        original_name: &str,
        mime_type: &str,
        prefix: &str,
    ) -> Result<StoredObject> {
        let key = generate_key(prefix, original_name, mime_type);
        let size = bytes.len();
        let content_type = content_type_for(&key, mime_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| QuillError::Storage(format!("failed to upload {key}: {e}")))?;

        debug!(key = %key, size, bucket = %self.bucket, "uploaded object");
        Ok(StoredObject {
            url: self.url_for(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| QuillError::Storage(format!("failed to delete {key}: {e}")))?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<LoadedObject> {
        check_key(key)?;
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| QuillError::Storage(format!("failed to read {key}: {e}")))?;

        let content_type = content_type_for(key, response.content_type().unwrap_or_default());
        let body = response
            .body
            .collect()
            .await
            .map_err(|e| QuillError::Storage(format!("failed to read {key}: {e}")))?;
        Ok(LoadedObject {
            bytes: body.into_bytes().to_vec(),
            content_type,
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }
}
