//! S3 blob store backend.

use std::path::Path;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::{BlobStore, StorageError};

/// S3-backed blob store.
///
/// URLs are built from a configured public base (CDN or bucket endpoint)
/// rather than presigned, matching how the published artifacts are served.
pub struct S3Store {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Store {
    /// Build a store from the ambient AWS environment (credentials chain,
    /// region) plus the bucket and public base URL.
    pub async fn from_env(bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&config),
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn new(client: Client, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for S3Store {
    async fn upload(&self, local: &Path, key: &str) -> Result<String, StorageError> {
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(key, bucket = %self.bucket, "Uploaded blob to S3");
        Ok(format!("{}/{key}", self.public_base_url))
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<(), StorageError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Download {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Download {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .into_bytes();

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}
