//! Generation job model and DTOs.
//!
//! A job is created by `POST /generate`, claimed by the worker, and ends
//! either completed (with result URLs and per-image metadata) or failed
//! (with an error message).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stylist_core::cut::Cut;
use stylist_core::generation::{ImageResult, Quality};
use stylist_core::types::{DbId, Timestamp};
use uuid::Uuid;

use super::status::{GenerationJobStatus, StatusId};

/// A row from the `generation_jobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct GenerationJob {
    pub id: DbId,
    pub job_id: Uuid,
    pub status_id: StatusId,
    pub family_id: String,
    pub color_id: String,
    pub cuts: serde_json::Value,
    pub seed: Option<i64>,
    pub quality: String,
    pub swatch_url: Option<String>,
    pub engine: Option<String>,
    pub result_urls: Option<serde_json::Value>,
    pub result_meta: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GenerationJob {
    pub fn status(&self) -> Option<GenerationJobStatus> {
        GenerationJobStatus::from_id(self.status_id)
    }

    /// Lookup-table name of the status, `"unknown"` for unseeded IDs.
    pub fn status_name(&self) -> &'static str {
        self.status().map(|s| s.name()).unwrap_or("unknown")
    }

    /// Requested cuts. Entries that no longer parse are skipped.
    pub fn cut_list(&self) -> Vec<Cut> {
        serde_json::from_value::<Vec<String>>(self.cuts.clone())
            .unwrap_or_default()
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect()
    }

    pub fn result_url_list(&self) -> Vec<String> {
        self.result_urls
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Stored per-image results, if the worker recorded them.
    pub fn result_images(&self) -> Vec<ImageResult> {
        self.result_meta
            .as_ref()
            .and_then(|meta| meta.get("images"))
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Wall-clock processing time, once the job has both timestamps.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

/// Admin representation of a job with the status resolved to its name.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationJobSummary {
    pub id: DbId,
    pub job_id: Uuid,
    pub status: &'static str,
    pub family_id: String,
    pub color_id: String,
    pub cuts: serde_json::Value,
    pub seed: Option<i64>,
    pub quality: String,
    pub swatch_url: Option<String>,
    pub engine: Option<String>,
    pub result_urls: Vec<String>,
    pub error_message: Option<String>,
    pub duration_ms: Option<i64>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<GenerationJob> for GenerationJobSummary {
    fn from(job: GenerationJob) -> Self {
        Self {
            status: job.status_name(),
            result_urls: job.result_url_list(),
            duration_ms: job.duration_ms(),
            id: job.id,
            job_id: job.job_id,
            family_id: job.family_id,
            color_id: job.color_id,
            cuts: job.cuts,
            seed: job.seed,
            quality: job.quality,
            swatch_url: job.swatch_url,
            engine: job.engine,
            error_message: job.error_message,
            started_at: job.started_at,
            completed_at: job.completed_at,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Input for inserting a pending job.
#[derive(Debug, Clone)]
pub struct CreateGenerationJob {
    pub family_id: String,
    pub color_id: String,
    pub cuts: Vec<Cut>,
    pub seed: Option<u32>,
    pub quality: Quality,
    pub swatch_url: Option<String>,
}

/// Query parameters for `GET /admin/generations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationJobListQuery {
    pub family_id: Option<String>,
    pub color_id: Option<String>,
    /// Status name (`pending`, `processing`, `completed`, `failed`).
    #[serde(alias = "status_filter")]
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Job count for one family in [`GenerationStats::by_family`].
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct FamilyCount {
    pub family_id: String,
    pub count: i64,
}

/// Aggregate counters for `GET /admin/generations/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStats {
    pub total_generations: i64,
    pub by_status: BTreeMap<String, i64>,
    /// Top families by job count.
    pub by_family: Vec<FamilyCount>,
    pub last_24_hours: i64,
}
