//! Swatch upload validation and key naming.

use crate::error::CoreError;

/// Content types accepted for swatch uploads.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Maximum swatch upload size (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Storage prefix for uploaded swatches.
pub const UPLOAD_PREFIX: &str = "temp-uploads";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Validate content type and size of an uploaded swatch.
pub fn validate_upload(content_type: Option<&str>, size: usize) -> Result<(), CoreError> {
    let content_type = content_type.unwrap_or_default();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(CoreError::Validation(format!(
            "Invalid file type '{content_type}'. Allowed: {}",
            ALLOWED_CONTENT_TYPES.join(", ")
        )));
    }
    if size == 0 {
        return Err(CoreError::Validation("Empty file".into()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "File too large. Max size: {}MB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Extension to store an upload under, derived from the client filename.
///
/// Unknown or missing extensions fall back to `jpg`.
pub fn upload_extension(filename: Option<&str>) -> &'static str {
    let ext = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some(ext) => ALLOWED_EXTENSIONS
            .iter()
            .find(|allowed| **allowed == ext)
            .copied()
            .unwrap_or("jpg"),
        None => "jpg",
    }
}

/// Fresh storage key for an uploaded swatch: `temp-uploads/{12 hex}.{ext}`.
pub fn swatch_upload_key(filename: Option<&str>) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{UPLOAD_PREFIX}/{}.{}", &id[..12], upload_extension(filename))
}
