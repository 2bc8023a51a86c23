use axum::routing::get;
use axum::Router;

use crate::handlers::generations;
use crate::state::AppState;

/// Routes mounted at `/admin/generations`.
///
/// ```text
/// GET    /                                   -> list
/// GET    /stats                              -> stats
/// GET    /by-fabric/{family_id}/{color_id}   -> list_by_fabric
/// GET    /{job_id}                           -> get_by_job_id
/// DELETE /{job_id}                           -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(generations::list))
        .route("/stats", get(generations::stats))
        .route(
            "/by-fabric/{family_id}/{color_id}",
            get(generations::list_by_fabric),
        )
        .route(
            "/{job_id}",
            get(generations::get_by_job_id).delete(generations::delete),
        )
}
