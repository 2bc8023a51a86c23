pub mod colors;
pub mod fabrics;
pub mod generations;
pub mod health;
pub mod storefront;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the application route tree (health and `/files` are mounted by the
/// router builder).
///
/// ```text
/// /catalog                                        storefront catalog (GET)
/// /generate                                       queue a job (POST)
/// /jobs/{job_id}                                  poll a job (GET)
/// /upload-swatch                                  multipart swatch upload (POST)
///
/// /admin/login                                    password -> token (public)
///
/// /admin/fabrics                                  list, create
/// /admin/fabrics/{id}                             get, update, delete
/// /admin/fabrics/{id}/deactivate                  deactivate (POST)
/// /admin/fabrics/{id}/status                      set status (PATCH)
/// /admin/fabrics/{id}/colors                      add color (POST)
///
/// /admin/colors                                   list
/// /admin/colors/{id}                              get, update, delete
/// /admin/colors/{id}/status                       set status (PATCH)
/// /admin/colors/{id}/move                         move to family (POST)
///
/// /admin/generations                              list
/// /admin/generations/stats                        counters (GET)
/// /admin/generations/by-fabric/{family}/{color}   completed history (GET)
/// /admin/generations/{job_id}                     get, delete
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(storefront::router())
        .nest("/admin", admin_routes())
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .nest("/fabrics", fabrics::router())
        .nest("/colors", colors::router())
        .nest("/generations", generations::router())
}
