use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::colors;
use crate::state::AppState;

/// Routes mounted at `/admin/colors`.
///
/// ```text
/// GET    /               -> list
/// GET    /{id}           -> get_by_id
/// PATCH  /{id}           -> update
/// DELETE /{id}           -> delete
/// PATCH  /{id}/status    -> set_status
/// POST   /{id}/move      -> move_to_family
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(colors::list))
        .route(
            "/{id}",
            get(colors::get_by_id)
                .patch(colors::update)
                .delete(colors::delete),
        )
        .route("/{id}/status", patch(colors::set_status))
        .route("/{id}/move", post(colors::move_to_family))
}
