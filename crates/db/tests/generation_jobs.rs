//! Integration tests for the generation job lifecycle.

use sqlx::PgPool;
use stylist_core::cut::Cut;
use stylist_core::generation::Quality;
use stylist_db::models::generation_job::{CreateGenerationJob, GenerationJobListQuery};
use stylist_db::models::status::GenerationJobStatus;
use stylist_db::repositories::GenerationJobRepo;

fn new_job(family_id: &str, color_id: &str) -> CreateGenerationJob {
    CreateGenerationJob {
        family_id: family_id.to_string(),
        color_id: color_id.to_string(),
        cuts: vec![Cut::Recto, Cut::Cruzado],
        seed: Some(1234),
        quality: Quality::Final,
        swatch_url: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_job_is_pending(pool: PgPool) {
    let job = GenerationJobRepo::create(&pool, &new_job("lana", "azul")).await.unwrap();

    assert_eq!(job.status(), Some(GenerationJobStatus::Pending));
    assert_eq!(job.cut_list(), vec![Cut::Recto, Cut::Cruzado]);
    assert_eq!(job.seed, Some(1234));
    assert_eq!(job.quality, "final");
    assert!(job.started_at.is_none());

    let found = GenerationJobRepo::find_by_job_id(&pool, job.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, job.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claim_takes_oldest_pending_once(pool: PgPool) {
    let first = GenerationJobRepo::create(&pool, &new_job("lana", "a")).await.unwrap();
    let second = GenerationJobRepo::create(&pool, &new_job("lana", "b")).await.unwrap();

    let claimed = GenerationJobRepo::claim_next_pending(&pool).await.unwrap().unwrap();
    assert_eq!(claimed.id, first.id);
    assert_eq!(claimed.status(), Some(GenerationJobStatus::Processing));
    assert!(claimed.started_at.is_some());

    let next = GenerationJobRepo::claim_next_pending(&pool).await.unwrap().unwrap();
    assert_eq!(next.id, second.id);

    assert!(GenerationJobRepo::claim_next_pending(&pool).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_complete_records_results(pool: PgPool) {
    let job = GenerationJobRepo::create(&pool, &new_job("lana", "azul")).await.unwrap();
    let claimed = GenerationJobRepo::claim_next_pending(&pool).await.unwrap().unwrap();

    let urls = vec!["http://x/recto.jpg".to_string(), "http://x/cruzado.jpg".to_string()];
    let meta = serde_json::json!({ "engine": "mock", "images": [] });
    assert!(GenerationJobRepo::complete(&pool, claimed.id, "mock", &urls, &meta).await.unwrap());

    let done = GenerationJobRepo::find_by_job_id(&pool, job.job_id).await.unwrap().unwrap();
    assert_eq!(done.status(), Some(GenerationJobStatus::Completed));
    assert_eq!(done.result_url_list(), urls);
    assert_eq!(done.engine.as_deref(), Some("mock"));
    assert!(done.completed_at.is_some());
    assert!(done.duration_ms().unwrap() >= 0);

    // A terminal job cannot transition again.
    assert!(!GenerationJobRepo::fail(&pool, claimed.id, "late").await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fail_records_error(pool: PgPool) {
    let job = GenerationJobRepo::create(&pool, &new_job("lana", "azul")).await.unwrap();

    // Pending jobs must be claimed before they can fail.
    assert!(!GenerationJobRepo::fail(&pool, job.id, "too early").await.unwrap());

    let claimed = GenerationJobRepo::claim_next_pending(&pool).await.unwrap().unwrap();
    assert!(GenerationJobRepo::fail(&pool, claimed.id, "inference server down").await.unwrap());

    let failed = GenerationJobRepo::find_by_job_id(&pool, job.job_id).await.unwrap().unwrap();
    assert_eq!(failed.status(), Some(GenerationJobStatus::Failed));
    assert_eq!(failed.error_message.as_deref(), Some("inference server down"));
    assert!(failed.completed_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_and_history(pool: PgPool) {
    GenerationJobRepo::create(&pool, &new_job("lana", "azul")).await.unwrap();
    GenerationJobRepo::create(&pool, &new_job("lana", "gris")).await.unwrap();
    GenerationJobRepo::create(&pool, &new_job("lino", "azul")).await.unwrap();

    let claimed = GenerationJobRepo::claim_next_pending(&pool).await.unwrap().unwrap();
    GenerationJobRepo::complete(&pool, claimed.id, "mock", &[], &serde_json::json!({}))
        .await
        .unwrap();

    let lana = GenerationJobRepo::list(
        &pool,
        &GenerationJobListQuery {
            family_id: Some("lana".into()),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();
    assert_eq!(lana.len(), 2);
    // Newest first.
    assert_eq!(lana[0].color_id, "gris");

    let pending = GenerationJobRepo::list(
        &pool,
        &GenerationJobListQuery::default(),
        Some(GenerationJobStatus::Pending),
    )
    .await
    .unwrap();
    assert_eq!(pending.len(), 2);

    let history = GenerationJobRepo::list_completed_for_fabric(&pool, "lana", "azul", None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, claimed.id);

    let none = GenerationJobRepo::list_completed_for_fabric(&pool, "lino", "azul", None)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stats(pool: PgPool) {
    for color in ["a", "b", "c"] {
        GenerationJobRepo::create(&pool, &new_job("lana", color)).await.unwrap();
    }
    GenerationJobRepo::create(&pool, &new_job("lino", "a")).await.unwrap();
    let claimed = GenerationJobRepo::claim_next_pending(&pool).await.unwrap().unwrap();
    GenerationJobRepo::fail(&pool, claimed.id, "boom").await.unwrap();

    let stats = GenerationJobRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.total_generations, 4);
    assert_eq!(stats.last_24_hours, 4);
    assert_eq!(stats.by_status.get("pending"), Some(&3));
    assert_eq!(stats.by_status.get("failed"), Some(&1));
    assert_eq!(stats.by_family[0].family_id, "lana");
    assert_eq!(stats.by_family[0].count, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_job(pool: PgPool) {
    let job = GenerationJobRepo::create(&pool, &new_job("lana", "azul")).await.unwrap();
    assert!(GenerationJobRepo::delete(&pool, job.job_id).await.unwrap());
    assert!(!GenerationJobRepo::delete(&pool, job.job_id).await.unwrap());
    assert!(GenerationJobRepo::find_by_job_id(&pool, job.job_id).await.unwrap().is_none());
}
