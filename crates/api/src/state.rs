use std::sync::Arc;

use stylist_storage::SharedStorage;

use crate::catalog::CatalogResponse;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: stylist_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Backend used for swatch uploads.
    pub storage: SharedStorage,
    /// Static catalog loaded at startup, merged behind the database catalog.
    pub static_catalog: Arc<CatalogResponse>,
}
