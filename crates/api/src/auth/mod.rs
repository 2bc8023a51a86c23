//! Authentication primitives.
//!
//! - [`password`] -- Argon2id hashing and verification of the admin password.
//! - [`jwt`] -- JWT access-token generation and validation.

pub mod jwt;
pub mod password;

/// Role claim carried by admin tokens.
pub const ROLE_ADMIN: &str = "admin";

/// Subject claim for the single admin account.
pub const ADMIN_SUBJECT: &str = "admin";
