//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod color_repo;
pub mod fabric_repo;
pub mod generation_job_repo;

pub use color_repo::ColorRepo;
pub use fabric_repo::FabricRepo;
pub use generation_job_repo::GenerationJobRepo;

/// Build a case-insensitive `ILIKE` pattern matching `needle` anywhere,
/// escaping the pattern metacharacters it contains.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
