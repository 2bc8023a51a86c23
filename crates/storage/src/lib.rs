//! Object storage for swatch uploads and generated renders.
//!
//! Two backends implement [`StorageBackend`]: the local filesystem (served
//! by the API under `/files`) and Cloudflare R2 through its S3-compatible
//! API. Both return the public URL of the stored object.

pub mod config;
pub mod local;
pub mod r2;

use std::sync::Arc;

use async_trait::async_trait;
use stylist_core::error::CoreError;

pub use config::{StorageBackendKind, StorageConfig};
pub use local::LocalStorage;
pub use r2::R2Storage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(#[from] CoreError),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object upload failed: {0}")]
    Upload(String),

    #[error("Storage misconfigured: {0}")]
    Config(String),
}

/// A place generated and uploaded images can be written to.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `key` and return its public URL.
    async fn save_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Short backend name for logs (`local`, `r2`).
    fn backend_name(&self) -> &'static str;
}

/// Shared handle to the configured backend.
pub type SharedStorage = Arc<dyn StorageBackend>;

/// Build the backend selected by `config`.
pub async fn build_storage(config: &StorageConfig) -> Result<SharedStorage, StorageError> {
    let storage: SharedStorage = match config.backend {
        StorageBackendKind::Local => Arc::new(LocalStorage::new(
            config.local_dir.clone(),
            config.local_base_url(),
        )),
        StorageBackendKind::R2 => {
            let r2 = config.r2.as_ref().ok_or_else(|| {
                StorageError::Config("STORAGE_BACKEND=r2 requires R2 credentials".into())
            })?;
            Arc::new(R2Storage::connect(r2).await)
        }
    };
    tracing::info!(backend = storage.backend_name(), "Storage backend ready");
    Ok(storage)
}
