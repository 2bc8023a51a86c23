//! Fabric family model and DTOs.
//!
//! A fabric family groups the colors a fabric is sold in. Families are
//! addressed by internal `id` in the admin API and by `family_id` in the
//! storefront and generation requests.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stylist_core::catalog::{validate_identifier, validate_name, validate_status};
use stylist_core::error::CoreError;
use stylist_core::types::{DbId, Timestamp};

use super::color::{Color, CreateColor};

/// A row from the `fabric_families` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FabricFamily {
    pub id: DbId,
    pub family_id: String,
    pub display_name: String,
    pub status: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A fabric family with its colors, as returned by the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct FabricWithColors {
    #[serde(flatten)]
    pub fabric: FabricFamily,
    pub colors: Vec<Color>,
}

/// DTO for creating a fabric family with optional initial colors.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFabric {
    pub family_id: String,
    pub display_name: String,
    pub status: Option<String>,
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub colors: Vec<CreateColor>,
}

impl CreateFabric {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_identifier("family_id", &self.family_id)?;
        validate_name("display_name", &self.display_name)?;
        if let Some(status) = &self.status {
            validate_status(status)?;
        }
        validate_colors(&self.colors)
    }
}

/// DTO for updating a fabric family.
///
/// When `colors` is present the family's colors are replaced wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFabric {
    pub display_name: Option<String>,
    pub status: Option<String>,
    pub sort_order: Option<i32>,
    pub colors: Option<Vec<CreateColor>>,
}

impl UpdateFabric {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.display_name {
            validate_name("display_name", name)?;
        }
        if let Some(status) = &self.status {
            validate_status(status)?;
        }
        match &self.colors {
            Some(colors) => validate_colors(colors),
            None => Ok(()),
        }
    }
}

/// Query parameters for `GET /admin/fabrics`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FabricListQuery {
    /// Case-insensitive match on `family_id` or `display_name`.
    pub q: Option<String>,
    #[serde(alias = "status_filter")]
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validate nested colors, rejecting duplicate `color_id`s within the batch.
fn validate_colors(colors: &[CreateColor]) -> Result<(), CoreError> {
    for (idx, color) in colors.iter().enumerate() {
        color.validate()?;
        if colors[..idx].iter().any(|c| c.color_id == color.color_id) {
            return Err(CoreError::Validation(format!(
                "Duplicate color_id '{}' in request",
                color.color_id
            )));
        }
    }
    Ok(())
}
