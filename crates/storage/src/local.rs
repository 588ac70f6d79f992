//! Local-filesystem blob store for development and tests.

use std::path::{Path, PathBuf};

use crate::{BlobStore, StorageError};

/// Stores blobs under a root directory, mirroring the key layout.
///
/// Returned URLs are `{base_url}/{key}`; `base_url` is whatever the
/// deployment serves that directory under (tests just use a placeholder).
pub struct LocalStore {
    root: PathBuf,
    base_url: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Filesystem path backing a key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalStore {
    async fn upload(&self, local: &Path, key: &str) -> Result<String, StorageError> {
        let dest = self.path_for(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local, &dest).await?;
        Ok(format!("{}/{key}", self.base_url))
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<(), StorageError> {
        let src = self.path_for(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&src, dest)
            .await
            .map_err(|e| StorageError::Download {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_download_round_trips() {
        let root = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let store = LocalStore::new(root.path(), "https://blobs.test");

        let src = scratch.path().join("a.png");
        tokio::fs::write(&src, b"png-bytes").await.unwrap();

        let url = store.upload(&src, "ch/pub/a.png").await.unwrap();
        assert_eq!(url, "https://blobs.test/ch/pub/a.png");
        assert!(store.path_for("ch/pub/a.png").is_file());

        let dest = scratch.path().join("out/a.png");
        store.download("ch/pub/a.png", &dest).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn download_of_missing_key_fails() {
        let root = tempfile::tempdir().unwrap();
        let store = LocalStore::new(root.path(), "https://blobs.test");

        let err = store
            .download("nope/missing.png", &root.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Download { .. }));
    }
}
