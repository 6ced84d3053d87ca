//! Storage for uploaded post images.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;

use crate::{AppError, AppResult};

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (relative path such as `posts/cat.gif`).
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

/// Longest file name [`sanitize_file_name`] returns.
pub const MAX_FILE_NAME_LEN: usize = 80;

/// Longest extension kept by [`sanitize_file_name`].
const MAX_EXTENSION_LEN: usize = 10;

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file under a new key.
    ///
    /// Returns [`AppError::Conflict`] if the key is already taken; existing
    /// files are never overwritten.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Shared handle to a storage backend.
pub type SharedStorage = Arc<dyn StorageBackend>;

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
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile> {
        let path = self.base_path.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => AppError::Conflict(format!("File already exists: {key}")),
                _ => AppError::Storage(format!("Failed to create file: {e}")),
            })?;

        if let Err(e) = file.write_all(data).await {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(AppError::Storage(format!("Failed to write file: {e}")));
        }
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        tracing::debug!(key = %key, size = data.len(), "Stored uploaded file");

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
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
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped; anything outside `[A-Za-z0-9._-]` becomes `_`.
/// Long names are cut to [`MAX_FILE_NAME_LEN`], keeping a short extension.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "upload".to_string();
    }
    if cleaned.len() <= MAX_FILE_NAME_LEN {
        return cleaned.to_string();
    }

    // Only ASCII is left, so byte offsets are char boundaries
    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= MAX_EXTENSION_LEN => {
            let stem = &stem[..stem.len().min(MAX_FILE_NAME_LEN - ext.len() - 1)];
            format!("{stem}.{ext}")
        }
        _ => cleaned[..MAX_FILE_NAME_LEN].to_string(),
    }
}

/// Insert a suffix between a file stem and its extension.
#[must_use]
pub fn with_suffix(file_name: &str, suffix: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{suffix}.{ext}"),
        _ => format!("{file_name}_{suffix}"),
    }
}
