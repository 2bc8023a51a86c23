use stylist_core::watermark::WatermarkError;
use stylist_storage::StorageError;

use crate::api::InferenceApiError;
use crate::client::InferenceClientError;

/// Errors raised while rendering a job.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Api(#[from] InferenceApiError),

    #[error(transparent)]
    Client(#[from] InferenceClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Watermark error: {0}")]
    Watermark(#[from] WatermarkError),

    /// A workflow node failed on the inference server.
    #[error("Execution failed at node {node_id}: {message}")]
    Execution { node_id: String, message: String },

    /// The prompt was interrupted before producing output.
    #[error("Execution interrupted")]
    Interrupted,

    /// The server reported success but no image could be located.
    #[error("no images generated")]
    NoOutput,

    #[error("Inference timed out after {0}s")]
    Timeout(u64),

    /// A required local asset (reference, mask, watermark) is missing.
    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Swatch error: {0}")]
    Swatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
