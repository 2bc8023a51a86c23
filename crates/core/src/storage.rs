//! Object key construction and public URL helpers.

use url::Url;

use crate::cut::Cut;
use crate::error::CoreError;

/// Storage prefix for generated renders.
pub const GENERATED_PREFIX: &str = "generated";

/// Normalize a storage key: strip leading separators and reject traversal.
pub fn normalize_key(key: &str) -> Result<String, CoreError> {
    let trimmed = key.trim_start_matches(['/', '\\']);
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Storage key must not be empty".into()));
    }
    if trimmed.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(CoreError::Validation(format!(
            "Storage key '{key}' must not contain '..' segments"
        )));
    }
    Ok(trimmed.to_string())
}

/// Key for a generated render: `generated/{family}/{color}/{run}/{cut}.jpg`.
pub fn generated_image_key(family_id: &str, color_id: &str, run_id: &str, cut: Cut) -> String {
    format!("{GENERATED_PREFIX}/{family_id}/{color_id}/{run_id}/{cut}.jpg")
}

/// Short random identifier grouping the renders of one generation run.
pub fn new_run_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..10].to_string()
}

/// Rebase a storage URL onto the public base URL.
///
/// Absolute URLs keep their path, query and fragment and lose scheme and
/// host; relative paths are appended as-is. Trailing slashes on
/// `public_base` are ignored.
pub fn rewrite_public_url(saved_url: &str, public_base: &str) -> String {
    let base = public_base.trim_end_matches('/');
    let tail = match Url::parse(saved_url) {
        Ok(url) if url.has_host() => {
            let mut tail = match url.path() {
                "/" => String::new(),
                path => path.to_string(),
            };
            if let Some(query) = url.query() {
                tail.push('?');
                tail.push_str(query);
            }
            if let Some(fragment) = url.fragment() {
                tail.push('#');
                tail.push_str(fragment);
            }
            tail
        }
        _ => saved_url.to_string(),
    };
    if tail.is_empty() || tail.starts_with(['/', '?', '#']) {
        format!("{base}{tail}")
    } else {
        format!("{base}/{tail}")
    }
}
