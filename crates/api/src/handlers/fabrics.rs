//! Handlers for the `/admin/fabrics` resource.
//!
//! Fabric families are addressed by their internal id. Creating or
//! updating a family can carry its full color list.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use stylist_core::catalog::{validate_status, STATUS_INACTIVE};
use stylist_core::error::CoreError;
use stylist_core::types::DbId;
use stylist_db::models::color::{CreateColor, UpdateStatus};
use stylist_db::models::fabric::{CreateFabric, FabricListQuery, FabricWithColors, UpdateFabric};
use stylist_db::repositories::{ColorRepo, FabricRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Fabric",
        id,
    })
}

async fn load(state: &AppState, id: DbId) -> AppResult<FabricWithColors> {
    FabricRepo::find_with_colors(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// GET /admin/fabrics?q=&status=&limit=&offset=
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<FabricListQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &params.status {
        validate_status(status)?;
    }
    let fabrics = FabricRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: fabrics }))
}

/// POST /admin/fabrics
///
/// Create a family together with its initial colors.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateFabric>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let fabric = FabricRepo::create_with_colors(&state.pool, &input).await?;
    tracing::info!(
        id = fabric.fabric.id,
        family_id = %fabric.fabric.family_id,
        colors = fabric.colors.len(),
        "Fabric created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: fabric })))
}

/// GET /admin/fabrics/{id}
pub async fn get_by_id(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let fabric = load(&state, id).await?;
    Ok(Json(DataResponse { data: fabric }))
}

/// PATCH /admin/fabrics/{id}
///
/// Partial update. A `colors` array replaces every color of the family.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateFabric>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let fabric = FabricRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: fabric }))
}

/// POST /admin/fabrics/{id}/deactivate
pub async fn deactivate(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    FabricRepo::set_status(&state.pool, id, STATUS_INACTIVE)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(id, "Fabric deactivated");
    let fabric = load(&state, id).await?;
    Ok(Json(DataResponse { data: fabric }))
}

/// PATCH /admin/fabrics/{id}/status
pub async fn set_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatus>,
) -> AppResult<impl IntoResponse> {
    validate_status(&input.status)?;
    FabricRepo::set_status(&state.pool, id, &input.status)
        .await?
        .ok_or_else(|| not_found(id))?;
    let fabric = load(&state, id).await?;
    Ok(Json(DataResponse { data: fabric }))
}

/// DELETE /admin/fabrics/{id}
///
/// Removes the family and, by cascade, its colors.
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !FabricRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(id, "Fabric deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/fabrics/{id}/colors
pub async fn add_color(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateColor>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if FabricRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found(id));
    }
    let color = ColorRepo::create(&state.pool, id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: color })))
}
