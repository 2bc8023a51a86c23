//! Processing of a single claimed generation job.

use serde_json::json;
use sqlx::PgPool;
use stylist_core::generation::{GenerationOutput, GenerationRequest, Quality};
use stylist_db::models::generation_job::GenerationJob;
use stylist_db::repositories::GenerationJobRepo;
use stylist_generation::Generator;

/// How a claimed job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { images: usize },
    Failed { error: String },
}

/// Rebuild the engine request from a stored job row.
pub fn request_from_job(job: &GenerationJob) -> GenerationRequest {
    GenerationRequest {
        family_id: job.family_id.clone(),
        color_id: job.color_id.clone(),
        cuts: job.cut_list(),
        seed: job.seed.and_then(|s| u32::try_from(s).ok()),
        quality: Quality::parse(&job.quality).unwrap_or_default(),
        swatch_url: job.swatch_url.clone(),
    }
}

/// Metadata persisted on a completed job.
pub fn result_meta(output: &GenerationOutput) -> serde_json::Value {
    json!({
        "engine": output.engine,
        "run_id": output.run_id,
        "duration_ms": output.duration_ms,
        "images": output.images,
        "run": output.meta,
    })
}

/// Run the generator for `job` and record the outcome.
///
/// Generation errors fail the job; only database errors are returned.
pub async fn process_job(
    pool: &PgPool,
    generator: &dyn Generator,
    job: &GenerationJob,
) -> Result<JobOutcome, sqlx::Error> {
    let request = request_from_job(job);
    tracing::info!(
        job_id = %job.job_id,
        family_id = %request.family_id,
        color_id = %request.color_id,
        cuts = ?request.cuts,
        engine = generator.engine_name(),
        "Processing generation job",
    );

    match generator.generate(&request).await {
        Ok(output) if output.images.is_empty() => {
            let error = "no images generated".to_string();
            GenerationJobRepo::fail(pool, job.id, &error).await?;
            tracing::warn!(job_id = %job.job_id, "Generation produced no images");
            Ok(JobOutcome::Failed { error })
        }
        Ok(output) => {
            let urls: Vec<String> = output.images.iter().map(|img| img.url.clone()).collect();
            let recorded =
                GenerationJobRepo::complete(pool, job.id, &output.engine, &urls, &result_meta(&output))
                    .await?;
            if !recorded {
                tracing::warn!(job_id = %job.job_id, "Job left processing state before completion");
            }
            tracing::info!(
                job_id = %job.job_id,
                images = urls.len(),
                duration_ms = output.duration_ms,
                "Generation job completed",
            );
            Ok(JobOutcome::Completed { images: urls.len() })
        }
        Err(e) => {
            let error = e.to_string();
            GenerationJobRepo::fail(pool, job.id, &error).await?;
            tracing::error!(job_id = %job.job_id, error = %error, "Generation job failed");
            Ok(JobOutcome::Failed { error })
        }
    }
}
