//! Repository for the `generation_jobs` table.
//!
//! Uses `GenerationJobStatus` from `models::status` for every status
//! transition.

use std::collections::BTreeMap;

use sqlx::PgPool;
use stylist_core::catalog::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use stylist_core::types::DbId;
use uuid::Uuid;

use crate::models::generation_job::{
    CreateGenerationJob, FamilyCount, GenerationJob, GenerationJobListQuery, GenerationStats,
};
use crate::models::status::{GenerationJobStatus, StatusId};

/// Column list for `generation_jobs` queries.
const COLUMNS: &str = "\
    id, job_id, status_id, family_id, color_id, cuts, seed, quality, swatch_url, \
    engine, result_urls, result_meta, error_message, \
    started_at, completed_at, created_at, updated_at";

/// Default page size for the per-fabric history.
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Maximum page size for the per-fabric history.
pub const MAX_HISTORY_LIMIT: i64 = 100;

/// Number of families reported in [`GenerationStats::by_family`].
const TOP_FAMILIES: i64 = 10;

/// Provides persistence for generation jobs.
pub struct GenerationJobRepo;

impl GenerationJobRepo {
    /// Insert a new pending job with a fresh `job_id`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateGenerationJob,
    ) -> Result<GenerationJob, sqlx::Error> {
        let cuts: Vec<&str> = input.cuts.iter().map(|c| c.as_str()).collect();
        let query = format!(
            "INSERT INTO generation_jobs \
                (job_id, status_id, family_id, color_id, cuts, seed, quality, swatch_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationJob>(&query)
            .bind(Uuid::new_v4())
            .bind(GenerationJobStatus::Pending.id())
            .bind(&input.family_id)
            .bind(&input.color_id)
            .bind(serde_json::json!(cuts))
            .bind(input.seed.map(i64::from))
            .bind(input.quality.as_str())
            .bind(&input.swatch_url)
            .fetch_one(pool)
            .await
    }

    /// Find a job by its public UUID.
    pub async fn find_by_job_id(
        pool: &PgPool,
        job_id: Uuid,
    ) -> Result<Option<GenerationJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_jobs WHERE job_id = $1");
        sqlx::query_as::<_, GenerationJob>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically claim the oldest pending job and mark it processing.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent workers never
    /// claim the same job.
    pub async fn claim_next_pending(pool: &PgPool) -> Result<Option<GenerationJob>, sqlx::Error> {
        let query = format!(
            "UPDATE generation_jobs \
             SET status_id = $1, started_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM generation_jobs \
                 WHERE status_id = $2 \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationJob>(&query)
            .bind(GenerationJobStatus::Processing.id())
            .bind(GenerationJobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a processing job completed with its result URLs and metadata.
    ///
    /// Returns `false` if the job was not in the processing state.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        engine: &str,
        result_urls: &[String],
        result_meta: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_jobs \
             SET status_id = $2, engine = $3, result_urls = $4, result_meta = $5, \
                 error_message = NULL, completed_at = NOW() \
             WHERE id = $1 AND status_id = $6",
        )
        .bind(id)
        .bind(GenerationJobStatus::Completed.id())
        .bind(engine)
        .bind(serde_json::json!(result_urls))
        .bind(result_meta)
        .bind(GenerationJobStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a processing job failed with an error message.
    ///
    /// No automatic retry is performed.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_jobs \
             SET status_id = $2, error_message = $3, completed_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(GenerationJobStatus::Failed.id())
        .bind(error)
        .bind(GenerationJobStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List jobs newest first with optional family, color and status filters.
    pub async fn list(
        pool: &PgPool,
        params: &GenerationJobListQuery,
        status: Option<GenerationJobStatus>,
    ) -> Result<Vec<GenerationJob>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(params.offset);

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if params.family_id.is_some() {
            conditions.push(format!("family_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.color_id.is_some() {
            conditions.push(format!("color_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if status.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM generation_jobs \
             {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, GenerationJob>(&query);
        if let Some(family_id) = &params.family_id {
            q = q.bind(family_id);
        }
        if let Some(color_id) = &params.color_id {
            q = q.bind(color_id);
        }
        if let Some(status) = status {
            q = q.bind(status.id());
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Completed jobs for one family/color pair, newest first.
    pub async fn list_completed_for_fabric(
        pool: &PgPool,
        family_id: &str,
        color_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<GenerationJob>, sqlx::Error> {
        let limit = clamp_limit(limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM generation_jobs \
             WHERE family_id = $1 AND color_id = $2 AND status_id = $3 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4"
        );
        sqlx::query_as::<_, GenerationJob>(&query)
            .bind(family_id)
            .bind(color_id)
            .bind(GenerationJobStatus::Completed.id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Aggregate job counters for the admin dashboard.
    pub async fn stats(pool: &PgPool) -> Result<GenerationStats, sqlx::Error> {
        let (total_generations,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM generation_jobs")
            .fetch_one(pool)
            .await?;

        let status_rows: Vec<(StatusId, i64)> = sqlx::query_as(
            "SELECT status_id, COUNT(*) FROM generation_jobs GROUP BY status_id",
        )
        .fetch_all(pool)
        .await?;
        let by_status: BTreeMap<String, i64> = status_rows
            .into_iter()
            .map(|(status_id, count)| {
                let name = GenerationJobStatus::from_id(status_id)
                    .map(|s| s.name().to_string())
                    .unwrap_or_else(|| status_id.to_string());
                (name, count)
            })
            .collect();

        let by_family = sqlx::query_as::<_, FamilyCount>(
            "SELECT family_id, COUNT(*) AS count FROM generation_jobs \
             GROUP BY family_id \
             ORDER BY count DESC, family_id \
             LIMIT $1",
        )
        .bind(TOP_FAMILIES)
        .fetch_all(pool)
        .await?;

        let (last_24_hours,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM generation_jobs WHERE created_at >= NOW() - INTERVAL '24 hours'",
        )
        .fetch_one(pool)
        .await?;

        Ok(GenerationStats {
            total_generations,
            by_status,
            by_family,
            last_24_hours,
        })
    }

    /// Delete a job record. Stored images are left untouched.
    pub async fn delete(pool: &PgPool, job_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM generation_jobs WHERE job_id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
