//! Claim-step contract: across any number of concurrent claimants, each
//! pending job is claimed by exactly one, and the by-id claim used by the
//! queue path only wins while the job is still pending.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use recon_core::models::document::DocumentKind;
use recon_core::models::{Job, JobTrigger, NewJob};
use recon_core::orchestration::JobClaimer;
use recon_core::test_helpers::create_test_job;

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn exactly_one_of_n_claimants_wins(pool: PgPool) {
    let job = create_test_job(&pool, DocumentKind::Sales).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            JobClaimer::new(pool).claim_next_pending().await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if let Some(claimed) = handle.await.unwrap() {
            assert_eq!(claimed.job_id, job.job_id);
            winners += 1;
        }
    }

    assert_eq!(winners, 1, "exactly one claimant must win the pending job");

    let stored = Job::find_by_id(&pool, job.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, "processing");
}

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn oldest_pending_job_is_claimed_first(pool: PgPool) {
    let now = Utc::now();

    let newer = Job::create(
        &pool,
        NewJob {
            document_kind: DocumentKind::Sales,
            job_type: JobTrigger::Auto,
            start_time: now - Duration::hours(1),
            end_time: now,
            triggered_by: None,
        },
    )
    .await
    .unwrap();

    let older = Job::create(
        &pool,
        NewJob {
            document_kind: DocumentKind::Purchases,
            job_type: JobTrigger::Auto,
            start_time: now - Duration::hours(48),
            end_time: now - Duration::hours(24),
            triggered_by: None,
        },
    )
    .await
    .unwrap();

    let claimer = JobClaimer::new(pool.clone());

    let first = claimer.claim_next_pending().await.unwrap().unwrap();
    assert_eq!(first.job_id, older.job_id);

    let second = claimer.claim_next_pending().await.unwrap().unwrap();
    assert_eq!(second.job_id, newer.job_id);

    assert!(claimer.claim_next_pending().await.unwrap().is_none());
}

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn by_id_claim_only_wins_while_pending(pool: PgPool) {
    let job = create_test_job(&pool, DocumentKind::Purchases).await;
    let claimer = JobClaimer::new(pool.clone());

    let claimed = claimer.claim_pending_by_id(job.job_id).await.unwrap();
    assert!(claimed.is_some());

    // Already processing: a second queued delivery must not win
    assert!(claimer.claim_pending_by_id(job.job_id).await.unwrap().is_none());

    Job::mark_done(&pool, job.job_id).await.unwrap();
    assert!(claimer.claim_pending_by_id(job.job_id).await.unwrap().is_none());
}

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn released_job_can_be_reclaimed(pool: PgPool) {
    let job = create_test_job(&pool, DocumentKind::Sales).await;
    let claimer = JobClaimer::new(pool.clone());

    claimer.claim_pending_by_id(job.job_id).await.unwrap().unwrap();
    assert!(claimer.release_to_pending(job.job_id).await.unwrap());

    let reclaimed = claimer.claim_pending_by_id(job.job_id).await.unwrap();
    assert!(reclaimed.is_some());

    // Releasing a job that is not processing is a no-op
    Job::mark_error(&pool, job.job_id, "boom").await.unwrap();
    assert!(!claimer.release_to_pending(job.job_id).await.unwrap());
}
