use axum::extract::State;
use axum::Json;
use stylist_db::repositories::FabricRepo;

use crate::catalog::{merge_catalog, CatalogFamily, CatalogResponse};
use crate::error::AppResult;
use crate::state::AppState;

/// GET /catalog
///
/// Active families with their active colors, backed by the static catalog.
pub async fn get_catalog(State(state): State<AppState>) -> AppResult<Json<CatalogResponse>> {
    let rows = FabricRepo::list_active_with_colors(&state.pool).await?;
    let families: Vec<CatalogFamily> = rows.into_iter().map(CatalogFamily::from).collect();
    Ok(Json(merge_catalog(families, &state.static_catalog)))
}
