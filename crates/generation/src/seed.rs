//! Reproducible seeding.
//!
//! One base seed per job; each cut derives its own seed from it so that
//! re-running a job with the same base seed reproduces every cut.

use sha2::{Digest, Sha256};
use stylist_core::cut::Cut;

/// The request's seed, or a fresh random 32-bit one.
pub fn resolve_base_seed(requested: Option<u32>) -> u32 {
    requested.unwrap_or_else(rand::random)
}

/// First four bytes (little-endian) of `SHA-256("{base}:{cut}")`.
pub fn derive_cut_seed(base_seed: u32, cut: Cut) -> u32 {
    let digest = Sha256::digest(format!("{base_seed}:{cut}").as_bytes());
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}
