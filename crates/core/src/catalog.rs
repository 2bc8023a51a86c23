//! Catalog validation rules for fabric families and colors.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Status of a family or color shown in the storefront.
pub const STATUS_ACTIVE: &str = "active";

/// Status of a family or color hidden from the storefront.
pub const STATUS_INACTIVE: &str = "inactive";

/// Valid catalog status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_INACTIVE];

/// Default page size for admin listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for admin listings.
pub const MAX_LIMIT: i64 = 200;

/// Maximum length of a `family_id` / `color_id`.
pub const MAX_IDENTIFIER_LEN: usize = 64;

static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex regex"));

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that `status` is `"active"` or `"inactive"`.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid status '{status}'. Must be one of: {VALID_STATUSES:?}"
        )))
    }
}

/// Validate a `#RRGGBB` hex color.
pub fn validate_hex_value(hex: &str) -> Result<(), CoreError> {
    if HEX_RE.is_match(hex) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid hex value '{hex}'. Expected format #RRGGBB"
        )))
    }
}

/// Validate a catalog business key (`family_id`, `color_id`).
///
/// Keys appear in storage paths, so whitespace and path separators are
/// rejected.
pub fn validate_identifier(field: &str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '\\')
        || value.contains("..")
    {
        return Err(CoreError::Validation(format!(
            "{field} '{value}' contains invalid characters"
        )));
    }
    Ok(())
}

/// Validate a required human-readable name.
pub fn validate_name(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Clamp a requested page size into `1..=max`, defaulting to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Negative offsets are treated as zero.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
