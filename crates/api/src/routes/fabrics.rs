use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::fabrics;
use crate::state::AppState;

/// Routes mounted at `/admin/fabrics`.
///
/// ```text
/// GET    /                   -> list
/// POST   /                   -> create
/// GET    /{id}               -> get_by_id
/// PATCH  /{id}               -> update
/// DELETE /{id}               -> delete
/// POST   /{id}/deactivate    -> deactivate
/// PATCH  /{id}/status        -> set_status
/// POST   /{id}/colors        -> add_color
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(fabrics::list).post(fabrics::create))
        .route(
            "/{id}",
            get(fabrics::get_by_id)
                .patch(fabrics::update)
                .delete(fabrics::delete),
        )
        .route("/{id}/deactivate", post(fabrics::deactivate))
        .route("/{id}/status", patch(fabrics::set_status))
        .route("/{id}/colors", post(fabrics::add_color))
}
