//! Color entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stylist_core::catalog::{validate_hex_value, validate_identifier, validate_name, validate_status};
use stylist_core::error::CoreError;
use stylist_core::types::{DbId, Timestamp};

/// A row from the `colors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Color {
    pub id: DbId,
    pub fabric_family_id: DbId,
    pub color_id: String,
    pub name: String,
    pub hex_value: Option<String>,
    pub swatch_code: Option<String>,
    pub swatch_url: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a color, either standalone or nested in a fabric.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateColor {
    pub color_id: String,
    pub name: String,
    pub hex_value: Option<String>,
    pub swatch_code: Option<String>,
    pub swatch_url: Option<String>,
    pub status: Option<String>,
}

impl CreateColor {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_identifier("color_id", &self.color_id)?;
        validate_name("name", &self.name)?;
        if let Some(hex) = &self.hex_value {
            validate_hex_value(hex)?;
        }
        if let Some(status) = &self.status {
            validate_status(status)?;
        }
        Ok(())
    }
}

/// DTO for updating a color. All fields optional; `fabric_family_id`
/// moves the color to another family.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateColor {
    pub fabric_family_id: Option<DbId>,
    pub color_id: Option<String>,
    pub name: Option<String>,
    pub hex_value: Option<String>,
    pub swatch_code: Option<String>,
    pub swatch_url: Option<String>,
    pub status: Option<String>,
}

impl UpdateColor {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(color_id) = &self.color_id {
            validate_identifier("color_id", color_id)?;
        }
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(hex) = &self.hex_value {
            validate_hex_value(hex)?;
        }
        if let Some(status) = &self.status {
            validate_status(status)?;
        }
        Ok(())
    }
}

/// Body for `PATCH /admin/colors/{id}/status` and the fabric equivalent.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatus {
    pub status: String,
}

/// Body for `POST /admin/colors/{id}/move`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveColor {
    pub fabric_family_id: Option<DbId>,
}

/// Query parameters for `GET /admin/colors`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorListQuery {
    /// Case-insensitive match on `color_id`, `name` or `swatch_code`.
    pub q: Option<String>,
    /// Restrict to one family, by its business key.
    pub family_id: Option<String>,
    #[serde(alias = "status_filter")]
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
