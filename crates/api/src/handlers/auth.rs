//! Handler for `POST /admin/login`.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use stylist_core::error::CoreError;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::auth::{ADMIN_SUBJECT, ROLE_ADMIN};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// POST /admin/login
///
/// Exchange the admin password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let valid = verify_password(&input.password, &state.config.admin.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !valid {
        tracing::warn!("Rejected admin login");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid password".into(),
        )));
    }

    let jwt = &state.config.jwt;
    let access_token = generate_access_token(ADMIN_SUBJECT, ROLE_ADMIN, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    tracing::info!("Admin logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: jwt.expires_in_secs(),
    }))
}
