//! Filesystem-based object storage implementation.

use aesop_error::{AesopResult, StorageError, StorageErrorKind};
use aesop_interface::{MediaStore, StoredObject};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};

/// Filesystem storage backend.
///
/// Stores objects under the caller's hierarchical key, rooted at
/// `base_path`:
///
/// ```text
/// /var/aesop/media/
/// └── stories/
///     └── 7f3e.../
///         ├── pages/
///         │   ├── page-01-r0-1722170000123.png
///         │   └── page-02-r1-1722170044512.png
///         └── story-7f3e....pdf
/// ```
///
/// Writes are atomic (temp file + rename) and the returned reference carries
/// the SHA-256 of the content so callers can verify reads.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    base_path: PathBuf,
}

impl FileSystemStore {
    /// Create a new filesystem store.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> AesopResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem store");
        Ok(Self { base_path })
    }

    /// Compute SHA-256 hash of data.
    fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Resolve a key to a path under the base directory.
    ///
    /// Keys must be relative and free of `..` components so a key can never
    /// escape the store root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::new(StorageErrorKind::InvalidKey(
                "empty key".to_string(),
            )));
        }
        let relative = Path::new(key);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidKey(
                key.to_string(),
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait::async_trait]
impl MediaStore for FileSystemStore {
    #[tracing::instrument(skip(self, data), fields(key = %key, size = data.len(), mime = %mime))]
    async fn put(&self, key: &str, data: &[u8], mime: &str) -> AesopResult<StoredObject> {
        let path = self.resolve(key)?;
        let hash = Self::compute_hash(data);

        // Create parent directories
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::info!(
            key = %key,
            hash = %hash,
            size = data.len(),
            "Stored object"
        );

        Ok(StoredObject {
            key: key.to_string(),
            url: format!("file://{}", path.display()),
            sha256: hash,
            size_bytes: data.len() as i64,
        })
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &str) -> AesopResult<Vec<u8>> {
        let path = self.resolve(key)?;

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::debug!(key = %key, size = data.len(), "Retrieved object");

        Ok(data)
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn exists(&self, key: &str) -> AesopResult<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn delete(&self, key: &str) -> AesopResult<()> {
        let path = self.resolve(key)?;

        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::info!(key = %key, "Deleted object");

        Ok(())
    }
}
