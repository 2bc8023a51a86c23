//! Repository for the `colors` table.

use sqlx::{PgConnection, PgPool};
use stylist_core::catalog::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT, STATUS_ACTIVE};
use stylist_core::types::DbId;

use super::contains_pattern;
use crate::models::color::{Color, ColorListQuery, CreateColor, UpdateColor};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, fabric_family_id, color_id, name, hex_value, swatch_code, \
    swatch_url, status, created_at, updated_at";

/// Provides CRUD operations for colors.
pub struct ColorRepo;

impl ColorRepo {
    /// Insert a color under the given fabric family.
    pub async fn create(
        pool: &PgPool,
        fabric_family_id: DbId,
        input: &CreateColor,
    ) -> Result<Color, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut conn, fabric_family_id, input).await
    }

    /// Insert on an existing connection so callers can batch inside a
    /// transaction.
    pub(crate) async fn insert(
        conn: &mut PgConnection,
        fabric_family_id: DbId,
        input: &CreateColor,
    ) -> Result<Color, sqlx::Error> {
        let query = format!(
            "INSERT INTO colors \
                (fabric_family_id, color_id, name, hex_value, swatch_code, swatch_url, status) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'active')) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Color>(&query)
            .bind(fabric_family_id)
            .bind(&input.color_id)
            .bind(&input.name)
            .bind(&input.hex_value)
            .bind(&input.swatch_code)
            .bind(&input.swatch_url)
            .bind(&input.status)
            .fetch_one(&mut *conn)
            .await
    }

    /// Find a color by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Color>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM colors WHERE id = $1");
        sqlx::query_as::<_, Color>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a color by its business key.
    pub async fn find_by_color_id(
        pool: &PgPool,
        color_id: &str,
    ) -> Result<Option<Color>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM colors WHERE color_id = $1");
        sqlx::query_as::<_, Color>(&query)
            .bind(color_id)
            .fetch_optional(pool)
            .await
    }

    /// List colors with optional search, family and status filters.
    ///
    /// Ordered by name.
    pub async fn list(pool: &PgPool, params: &ColorListQuery) -> Result<Vec<Color>, sqlx::Error> {
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
                "(color_id ILIKE ${bind_idx} OR name ILIKE ${bind_idx} \
                  OR swatch_code ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }
        if params.family_id.is_some() {
            conditions.push(format!(
                "fabric_family_id IN (SELECT id FROM fabric_families WHERE family_id = ${bind_idx})"
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
            "SELECT {COLUMNS} FROM colors \
             {where_clause} \
             ORDER BY name, id \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, Color>(&query);
        if let Some(pattern) = &pattern {
            q = q.bind(pattern);
        }
        if let Some(family_id) = &params.family_id {
            q = q.bind(family_id);
        }
        if let Some(status) = &params.status {
            q = q.bind(status);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// All colors of the given families, ordered by name.
    pub async fn list_by_families(
        pool: &PgPool,
        fabric_family_ids: &[DbId],
        active_only: bool,
    ) -> Result<Vec<Color>, sqlx::Error> {
        let query = if active_only {
            format!(
                "SELECT {COLUMNS} FROM colors \
                 WHERE fabric_family_id = ANY($1) AND status = '{STATUS_ACTIVE}' \
                 ORDER BY name, id"
            )
        } else {
            format!(
                "SELECT {COLUMNS} FROM colors WHERE fabric_family_id = ANY($1) ORDER BY name, id"
            )
        };
        sqlx::query_as::<_, Color>(&query)
            .bind(fabric_family_ids)
            .fetch_all(pool)
            .await
    }

    /// Update a color. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateColor,
    ) -> Result<Option<Color>, sqlx::Error> {
        let query = format!(
            "UPDATE colors SET \
                fabric_family_id = COALESCE($2, fabric_family_id), \
                color_id = COALESCE($3, color_id), \
                name = COALESCE($4, name), \
                hex_value = COALESCE($5, hex_value), \
                swatch_code = COALESCE($6, swatch_code), \
                swatch_url = COALESCE($7, swatch_url), \
                status = COALESCE($8, status) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Color>(&query)
            .bind(id)
            .bind(input.fabric_family_id)
            .bind(&input.color_id)
            .bind(&input.name)
            .bind(&input.hex_value)
            .bind(&input.swatch_code)
            .bind(&input.swatch_url)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Set the status of a color.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Color>, sqlx::Error> {
        let query = format!("UPDATE colors SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Color>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Reassign a color to another fabric family.
    pub async fn move_to_family(
        pool: &PgPool,
        id: DbId,
        fabric_family_id: DbId,
    ) -> Result<Option<Color>, sqlx::Error> {
        let query =
            format!("UPDATE colors SET fabric_family_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Color>(&query)
            .bind(id)
            .bind(fabric_family_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete all colors of a family on an existing connection.
    pub(crate) async fn delete_by_family(
        conn: &mut PgConnection,
        fabric_family_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM colors WHERE fabric_family_id = $1")
            .bind(fabric_family_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete a color by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM colors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
