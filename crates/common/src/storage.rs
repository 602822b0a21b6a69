//! Storage abstraction for uploaded post images.

use std::path::{Component, Path, PathBuf};

use crate::{AppError, AppResult};

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (relative path).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the file.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));
        tracing::debug!(key = %key, size = data.len(), "Stored upload");

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }
}

/// Generate a unique storage key for a post image.
///
/// Keys look like `posts/2025/01/31/<author>/<millis>_<uuid>.<ext>`.
#[must_use]
pub fn generate_storage_key(author_id: &str, original_name: &str) -> String {
    use chrono::Utc;

    let now = Utc::now();
    let date_path = now.format("%Y/%m/%d").to_string();
    let timestamp = now.timestamp_millis();

    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);

    format!(
        "posts/{date_path}/{author_id}/{timestamp}_{}.{extension}",
        uuid::Uuid::new_v4().simple()
    )
}
