//! Handlers for the `/admin/generations` resource.
//!
//! Read and delete access to job records. Deleting a job leaves its stored
//! images in place.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use stylist_core::error::CoreError;
use stylist_db::models::generation_job::{GenerationJobListQuery, GenerationJobSummary};
use stylist_db::models::status::GenerationJobStatus;
use stylist_db::repositories::GenerationJobRepo;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::LimitParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(job_id: &str) -> AppError {
    AppError::Core(CoreError::NotFoundByKey {
        entity: "Generation job",
        key: job_id.to_string(),
    })
}

fn parse_job_id(job_id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(job_id).map_err(|_| not_found(job_id))
}

/// GET /admin/generations?family_id=&color_id=&status=&limit=&offset=
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<GenerationJobListQuery>,
) -> AppResult<impl IntoResponse> {
    let status = match params.status.as_deref() {
        Some(name) => Some(GenerationJobStatus::from_name(name).ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid status '{name}'. Must be one of: pending, processing, completed, failed"
            ))
        })?),
        None => None,
    };
    let jobs = GenerationJobRepo::list(&state.pool, &params, status).await?;
    let data: Vec<GenerationJobSummary> = jobs.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse { data }))
}

/// GET /admin/generations/by-fabric/{family_id}/{color_id}?limit=
///
/// Completed jobs for one fabric color, newest first.
pub async fn list_by_fabric(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((family_id, color_id)): Path<(String, String)>,
    Query(params): Query<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let jobs = GenerationJobRepo::list_completed_for_fabric(
        &state.pool,
        &family_id,
        &color_id,
        params.limit,
    )
    .await?;
    let data: Vec<GenerationJobSummary> = jobs.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse { data }))
}

/// GET /admin/generations/stats
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = GenerationJobRepo::stats(&state.pool).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /admin/generations/{job_id}
pub async fn get_by_job_id(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_job_id(&job_id)?;
    let job = GenerationJobRepo::find_by_job_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(&job_id))?;
    Ok(Json(DataResponse {
        data: GenerationJobSummary::from(job),
    }))
}

/// DELETE /admin/generations/{job_id}
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_job_id(&job_id)?;
    if !GenerationJobRepo::delete(&state.pool, id).await? {
        return Err(not_found(&job_id));
    }
    tracing::info!(job_id = %id, "Generation job deleted");
    Ok(StatusCode::NO_CONTENT)
}
