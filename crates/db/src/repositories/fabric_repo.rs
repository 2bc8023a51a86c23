//! Repository for the `fabric_families` table.
//!
//! Writes that touch colors as well (create with colors, replace-all
//! update) run in a single transaction so a duplicate `color_id` rolls
//! back the whole request.

use std::collections::HashMap;

use sqlx::PgPool;
use stylist_core::catalog::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT, STATUS_ACTIVE};
use stylist_core::types::DbId;

use super::color_repo::ColorRepo;
use super::contains_pattern;
use crate::models::color::Color;
use crate::models::fabric::{
    CreateFabric, FabricFamily, FabricListQuery, FabricWithColors, UpdateFabric,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, family_id, display_name, status, sort_order, created_at, updated_at";

/// Provides CRUD operations for fabric families.
pub struct FabricRepo;

impl FabricRepo {
    /// Insert a family and its initial colors atomically.
    pub async fn create_with_colors(
        pool: &PgPool,
        input: &CreateFabric,
    ) -> Result<FabricWithColors, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO fabric_families (family_id, display_name, status, sort_order) \
             VALUES ($1, $2, COALESCE($3, 'active'), COALESCE($4, 0)) \
             RETURNING {COLUMNS}"
        );
        let fabric = sqlx::query_as::<_, FabricFamily>(&query)
            .bind(&input.family_id)
            .bind(&input.display_name)
            .bind(&input.status)
            .bind(input.sort_order)
            .fetch_one(&mut *tx)
            .await?;

        let mut colors = Vec::with_capacity(input.colors.len());
        for color in &input.colors {
            colors.push(ColorRepo::insert(&mut tx, fabric.id, color).await?);
        }

        tx.commit().await?;
        colors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(FabricWithColors { fabric, colors })
    }

    /// Find a family by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<FabricFamily>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fabric_families WHERE id = $1");
        sqlx::query_as::<_, FabricFamily>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a family by its business key.
    pub async fn find_by_family_id(
        pool: &PgPool,
        family_id: &str,
    ) -> Result<Option<FabricFamily>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fabric_families WHERE family_id = $1");
        sqlx::query_as::<_, FabricFamily>(&query)
            .bind(family_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a family with all of its colors.
    pub async fn find_with_colors(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<FabricWithColors>, sqlx::Error> {
        let Some(fabric) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let colors = ColorRepo::list_by_families(pool, &[fabric.id], false).await?;
        Ok(Some(FabricWithColors { fabric, colors }))
    }

    /// List families with their colors, filtered by search term and status.
    ///
    /// Ordered by display name.
    pub async fn list(
        pool: &PgPool,
        params: &FabricListQuery,
    ) -> Result<Vec<FabricWithColors>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(params.offset);
        let pattern = params
            .q
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(contains_pattern);

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if pattern.is_some() {
            conditions.push(format!(
                "(family_id ILIKE ${bind_idx} OR display_name ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }
        if params.status.is_some() {
            conditions.push(format!("status = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM fabric_families \
             {where_clause} \
             ORDER BY display_name, id \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, FabricFamily>(&query);
        if let Some(pattern) = &pattern {
            q = q.bind(pattern);
        }
        if let Some(status) = &params.status {
            q = q.bind(status);
        }
        let fabrics = q.bind(limit).bind(offset).fetch_all(pool).await?;

        Self::attach_colors(pool, fabrics, false).await
    }

    /// Active families with their active colors, for the storefront catalog.
    ///
    /// Ordered by sort order, then display name.
    pub async fn list_active_with_colors(
        pool: &PgPool,
    ) -> Result<Vec<FabricWithColors>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM fabric_families \
             WHERE status = '{STATUS_ACTIVE}' \
             ORDER BY sort_order, display_name, id"
        );
        let fabrics = sqlx::query_as::<_, FabricFamily>(&query)
            .fetch_all(pool)
            .await?;
        Self::attach_colors(pool, fabrics, true).await
    }

    /// Update a family. Only non-`None` fields are applied; `colors`, when
    /// present, replaces every existing color of the family.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFabric,
    ) -> Result<Option<FabricWithColors>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE fabric_families SET \
                display_name = COALESCE($2, display_name), \
                status = COALESCE($3, status), \
                sort_order = COALESCE($4, sort_order) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let Some(fabric) = sqlx::query_as::<_, FabricFamily>(&query)
            .bind(id)
            .bind(&input.display_name)
            .bind(&input.status)
            .bind(input.sort_order)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if let Some(colors) = &input.colors {
            let removed = ColorRepo::delete_by_family(&mut tx, fabric.id).await?;
            tracing::debug!(fabric_id = fabric.id, removed, added = colors.len(), "Replacing fabric colors");
            for color in colors {
                ColorRepo::insert(&mut tx, fabric.id, color).await?;
            }
        }

        tx.commit().await?;

        let colors = ColorRepo::list_by_families(pool, &[fabric.id], false).await?;
        Ok(Some(FabricWithColors { fabric, colors }))
    }

    /// Set the status of a family.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<FabricFamily>, sqlx::Error> {
        let query =
            format!("UPDATE fabric_families SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, FabricFamily>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a family and, through the FK cascade, its colors.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fabric_families WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load colors for a page of families with one query and group them.
    async fn attach_colors(
        pool: &PgPool,
        fabrics: Vec<FabricFamily>,
        active_only: bool,
    ) -> Result<Vec<FabricWithColors>, sqlx::Error> {
        let ids: Vec<DbId> = fabrics.iter().map(|f| f.id).collect();
        let mut grouped: HashMap<DbId, Vec<Color>> = HashMap::new();
        if !ids.is_empty() {
            for color in ColorRepo::list_by_families(pool, &ids, active_only).await? {
                grouped.entry(color.fabric_family_id).or_default().push(color);
            }
        }
        Ok(fabrics
            .into_iter()
            .map(|fabric| {
                let colors = grouped.remove(&fabric.id).unwrap_or_default();
                FabricWithColors { fabric, colors }
            })
            .collect())
    }
}
