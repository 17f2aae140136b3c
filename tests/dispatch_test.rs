//! Polling worker loop behavior: a tick claims at most one job, records
//! the outcome on it, and survives processing failures.

mod common;

use std::sync::Arc;

use sqlx::PgPool;

use common::{build_processor, sample_document, MockAccountingGateway, MockPosGateway};
use recon_core::config::WorkerConfig;
use recon_core::models::document::DocumentKind;
use recon_core::models::Job;
use recon_core::orchestration::{JobClaimer, WorkerLoop};
use recon_core::test_helpers::create_test_job;

fn build_worker_loop(
    pool: &PgPool,
    pos: Arc<MockPosGateway>,
    accounting: Arc<MockAccountingGateway>,
) -> WorkerLoop {
    let processor = Arc::new(build_processor(pool, pos, accounting));
    WorkerLoop::new(
        pool.clone(),
        Arc::new(JobClaimer::new(pool.clone())),
        processor,
        &WorkerConfig::default(),
    )
}

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn tick_with_no_pending_jobs_is_a_noop(pool: PgPool) {
    let pos = Arc::new(MockPosGateway::with_documents(Vec::new()));
    let accounting = Arc::new(MockAccountingGateway::with_full_master_data());
    let worker = build_worker_loop(&pool, pos, accounting);

    assert!(worker.run_single_tick().await.unwrap().is_none());
}

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn tick_processes_a_job_to_done(pool: PgPool) {
    let job = create_test_job(&pool, DocumentKind::Sales).await;

    let pos = Arc::new(MockPosGateway::with_documents(vec![sample_document(
        DocumentKind::Sales,
        "FV-1",
        "900123456-1",
        "SKU-001",
    )]));
    let accounting = Arc::new(MockAccountingGateway::with_full_master_data());
    let worker = build_worker_loop(&pool, pos, accounting);

    let processed = worker.run_single_tick().await.unwrap();
    assert_eq!(processed, Some(job.job_id));

    let stored = Job::find_by_id(&pool, job.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, "done");
    assert!(stored.error.is_none());

    // The job is terminal; the next tick finds nothing to claim
    assert!(worker.run_single_tick().await.unwrap().is_none());
}

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn tick_records_processing_failure_on_the_job(pool: PgPool) {
    let job = create_test_job(&pool, DocumentKind::Sales).await;

    let mut pos = MockPosGateway::with_documents(Vec::new());
    pos.fail_export = true;
    let accounting = Arc::new(MockAccountingGateway::with_full_master_data());
    let worker = build_worker_loop(&pool, Arc::new(pos), accounting);

    // The tick itself succeeds; the failure lands on the job row
    let processed = worker.run_single_tick().await.unwrap();
    assert_eq!(processed, Some(job.job_id));

    let stored = Job::find_by_id(&pool, job.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, "error");
    assert!(stored.error.as_ref().unwrap().contains("export unavailable"));
}
