//! # Job Claimer
//!
//! Atomic job claiming for distributed dispatch. Any number of worker
//! processes poll the same job table; `FOR UPDATE SKIP LOCKED` makes
//! concurrent claimants skip rows another worker holds rather than block,
//! so each pending job is claimed by exactly one.
//!
//! The critical section is deliberately short: select + status flip +
//! commit. The ingestion work itself runs outside the lock, and a later
//! processing failure never rolls the claim back; it is recorded on the
//! job as a separate update.

use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Job;

const CLAIM_COLUMNS: &str = "job_id, source, document_kind, job_type, status, start_time, \
                             end_time, triggered_by, error, created_at, updated_at";

/// Claims pending jobs under row-level locking
pub struct JobClaimer {
    pool: PgPool,
    worker_id: String,
}

impl JobClaimer {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            worker_id: format!("recon-worker-{}", Uuid::new_v4()),
        }
    }

    /// Claim the oldest pending job, if any.
    ///
    /// Rows locked by concurrent claimants are skipped, not waited on.
    #[instrument(skip(self), fields(worker_id = %self.worker_id))]
    pub async fn claim_next_pending(&self) -> Result<Option<Job>> {
        let query = format!(
            "SELECT {CLAIM_COLUMNS} FROM recon_jobs \
             WHERE status = 'pending' AND source = 'pos' \
             ORDER BY start_time ASC \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED"
        );

        let mut tx = self.pool.begin().await?;

        let candidate = sqlx::query_as::<_, Job>(&query)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(mut job) = candidate else {
            tx.commit().await?;
            debug!("No pending jobs available for claiming");
            return Ok(None);
        };

        sqlx::query(
            "UPDATE recon_jobs SET status = 'processing', updated_at = NOW() WHERE job_id = $1",
        )
        .bind(job.job_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        job.status = "processing".to_string();

        debug!(job_id = job.job_id, "Claimed pending job");

        Ok(Some(job))
    }

    /// Claim one specific job if it is still pending.
    ///
    /// Used by the queue-driven dispatch path: the row claim is the single
    /// scheduling authority, so a queued request whose job was already
    /// claimed elsewhere comes back as `None` and is dropped.
    #[instrument(skip(self), fields(worker_id = %self.worker_id))]
    pub async fn claim_pending_by_id(&self, job_id: i64) -> Result<Option<Job>> {
        let query = format!(
            "SELECT {CLAIM_COLUMNS} FROM recon_jobs \
             WHERE job_id = $1 AND status = 'pending' \
             FOR UPDATE SKIP LOCKED"
        );

        let mut tx = self.pool.begin().await?;

        let candidate = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(mut job) = candidate else {
            tx.commit().await?;
            debug!(job_id = job_id, "Job not claimable (already claimed or finished)");
            return Ok(None);
        };

        sqlx::query(
            "UPDATE recon_jobs SET status = 'processing', updated_at = NOW() WHERE job_id = $1",
        )
        .bind(job.job_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        job.status = "processing".to_string();

        debug!(job_id = job.job_id, "Claimed job by id");

        Ok(Some(job))
    }

    /// Return a claimed job to the pending pool for a queued retry
    pub async fn release_to_pending(&self, job_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE recon_jobs SET status = 'pending', updated_at = NOW() \
             WHERE job_id = $1 AND status = 'processing'",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }
}
