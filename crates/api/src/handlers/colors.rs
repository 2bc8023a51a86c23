//! Handlers for the `/admin/colors` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use stylist_core::catalog::validate_status;
use stylist_core::error::CoreError;
use stylist_core::types::DbId;
use stylist_db::models::color::{ColorListQuery, MoveColor, UpdateColor, UpdateStatus};
use stylist_db::repositories::{ColorRepo, FabricRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Color",
        id,
    })
}

/// Fail with 404 unless the target family exists.
async fn ensure_family(state: &AppState, fabric_family_id: DbId) -> AppResult<()> {
    match FabricRepo::find_by_id(&state.pool, fabric_family_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Core(CoreError::NotFound {
            entity: "Target fabric family",
            id: fabric_family_id,
        })),
    }
}

/// GET /admin/colors?q=&family_id=&status=&limit=&offset=
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ColorListQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &params.status {
        validate_status(status)?;
    }
    let colors = ColorRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: colors }))
}

/// GET /admin/colors/{id}
pub async fn get_by_id(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let color = ColorRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: color }))
}

/// PATCH /admin/colors/{id}
///
/// Partial update; `fabric_family_id` moves the color.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateColor>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(target) = input.fabric_family_id {
        ensure_family(&state, target).await?;
    }
    let color = ColorRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: color }))
}

/// PATCH /admin/colors/{id}/status
pub async fn set_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatus>,
) -> AppResult<impl IntoResponse> {
    validate_status(&input.status)?;
    let color = ColorRepo::set_status(&state.pool, id, &input.status)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: color }))
}

/// POST /admin/colors/{id}/move
pub async fn move_to_family(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MoveColor>,
) -> AppResult<impl IntoResponse> {
    let target = input
        .fabric_family_id
        .ok_or_else(|| AppError::BadRequest("fabric_family_id is required".into()))?;
    if ColorRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found(id));
    }
    ensure_family(&state, target).await?;

    let color = ColorRepo::move_to_family(&state.pool, id, target)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(id, fabric_family_id = target, "Color moved");
    Ok(Json(DataResponse { data: color }))
}

/// DELETE /admin/colors/{id}
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ColorRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
