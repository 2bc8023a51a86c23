//! Filesystem storage backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stylist_core::storage::normalize_key;

use crate::{StorageBackend, StorageError};

/// Writes objects below a base directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(base_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute-or-relative filesystem path for a normalized key.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let key = normalize_key(key)?;
        Ok(self.base_dir.join(key))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn save_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let key = normalize_key(key)?;
        let path = self.base_dir.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = data.len();
        tokio::fs::write(&path, data).await?;
        tracing::debug!(path = %path.display(), size, "Stored object locally");
        Ok(format!("{}/{key}", self.base_url))
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
