//! Background worker that drains the generation job queue.
//!
//! The worker claims the oldest pending job, renders it with the
//! configured [`stylist_generation::Generator`] and records the result.
//! One job is processed at a time; run several workers to scale out.

pub mod config;
pub mod job;

use std::time::Duration;

use sqlx::PgPool;
use stylist_db::repositories::GenerationJobRepo;
use stylist_generation::Generator;
use tokio_util::sync::CancellationToken;

pub use config::WorkerConfig;
pub use job::{process_job, JobOutcome};

/// Claim and process at most one pending job.
///
/// Returns `None` when the queue is empty.
pub async fn poll_once(
    pool: &PgPool,
    generator: &dyn Generator,
) -> Result<Option<JobOutcome>, sqlx::Error> {
    let Some(job) = GenerationJobRepo::claim_next_pending(pool).await? else {
        return Ok(None);
    };
    process_job(pool, generator, &job).await.map(Some)
}

/// Poll until `cancel` fires.
///
/// A job that is already running is allowed to finish; cancellation is
/// only observed between jobs and while sleeping.
pub async fn run(
    pool: PgPool,
    generator: &dyn Generator,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        engine = generator.engine_name(),
        poll_interval_secs = poll_interval.as_secs(),
        "Worker loop started"
    );

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match poll_once(&pool, generator).await {
            Ok(Some(_)) => continue,
            Ok(None) => tracing::trace!("No pending jobs"),
            Err(e) => tracing::error!(error = %e, "Failed to poll generation jobs"),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }

    tracing::info!("Worker loop stopped");
}
