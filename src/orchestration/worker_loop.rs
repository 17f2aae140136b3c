//! # Polling Worker Loop
//!
//! Fixed-interval dispatcher. Each tick claims at most one pending job
//! under the row-level lock, runs the ingestion sequence for its window,
//! and records the outcome on the job. Processing errors never crash the
//! loop and are never retried at this layer; the only automatic retry in
//! the system belongs to the ingestion queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, instrument};

use crate::config::WorkerConfig;
use crate::constants::events;
use crate::error::Result;
use crate::models::Job;
use crate::orchestration::job_claimer::JobClaimer;
use crate::orchestration::lote_processor::LoteProcessor;

/// Polls the job table and drives claimed jobs to a terminal status
pub struct WorkerLoop {
    claimer: Arc<JobClaimer>,
    processor: Arc<LoteProcessor>,
    pool: sqlx::PgPool,
    poll_interval: Duration,
}

impl WorkerLoop {
    pub fn new(
        pool: sqlx::PgPool,
        claimer: Arc<JobClaimer>,
        processor: Arc<LoteProcessor>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            claimer,
            processor,
            pool,
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
        }
    }

    /// Run the polling loop until the process stops.
    ///
    /// Tick errors (claim or bookkeeping failures) are logged and the loop
    /// continues on the next interval.
    pub async fn run(&self) {
        info!(
            worker_id = %self.claimer.worker_id(),
            poll_interval_seconds = self.poll_interval.as_secs(),
            "Starting polling worker loop"
        );

        loop {
            if let Err(err) = self.run_single_tick().await {
                error!(error = %err, "Dispatch tick failed");
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Run one tick: claim at most one job and process it.
    ///
    /// Returns the processed job id, or `None` when no job was claimable.
    #[instrument(skip(self), fields(worker_id = %self.claimer.worker_id()))]
    pub async fn run_single_tick(&self) -> Result<Option<i64>> {
        let Some(job) = self.claimer.claim_next_pending().await? else {
            return Ok(None);
        };

        info!(
            event = events::JOB_CLAIMED,
            job_id = job.job_id,
            kind = %job.document_kind,
            "Claimed job; starting ingestion sequence"
        );

        // The claim is already committed; the work runs outside the lock.
        match self.processor.process_job(&job).await {
            Ok(summary) => {
                Job::mark_done(&self.pool, job.job_id).await?;
                info!(
                    event = events::JOB_COMPLETED,
                    job_id = job.job_id,
                    lote_id = summary.lote_id,
                    registered = summary.registered,
                    gate_tripped = summary.gate_tripped,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Job completed"
                );
            }
            Err(err) => {
                error!(
                    event = events::JOB_FAILED,
                    job_id = job.job_id,
                    error = %err,
                    "Job processing failed; recording error on the job"
                );
                Job::mark_error(&self.pool, job.job_id, &err.to_string()).await?;
            }
        }

        Ok(Some(job.job_id))
    }
}
