//! Virtual stylist HTTP API.
//!
//! Exposes the building blocks (config, state, error handling, routes) so
//! the integration tests and the binary entrypoint share one router.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
