use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use stylist_core::upload::MAX_UPLOAD_BYTES;

use crate::handlers::{catalog, generation};
use crate::state::AppState;

/// Headroom over the upload cap for multipart framing, so oversize files
/// reach validation and get a JSON error.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

/// Public storefront routes.
///
/// ```text
/// GET  /catalog         -> get_catalog
/// POST /generate        -> generate
/// GET  /jobs/{job_id}   -> get_job
/// POST /upload-swatch   -> upload_swatch
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(catalog::get_catalog))
        .route("/generate", post(generation::generate))
        .route("/jobs/{job_id}", get(generation::get_job))
        .route(
            "/upload-swatch",
            post(generation::upload_swatch).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}
