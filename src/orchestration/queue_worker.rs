//! # Ingestion Queue Worker
//!
//! The queue-driven dispatch path. Messages request ingestion for a
//! specific job; the job-row claim remains the single scheduling
//! authority, so a message whose job was already claimed (by the polling
//! loop or another queue worker) is dropped as already handled.
//!
//! Retry policy lives in the message metadata: a failed attempt releases
//! the job back to pending and re-enqueues the message with exponential
//! delay; once attempts are exhausted the failure is recorded on the job
//! and the message is archived.

use std::sync::Arc;
use std::time::Duration;

use pgmq::types::Message;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

use crate::config::QueueConfig;
use crate::constants::events;
use crate::error::Result;
use crate::messaging::{IngestionMessage, PgmqClient};
use crate::models::Job;
use crate::orchestration::job_claimer::JobClaimer;
use crate::orchestration::lote_processor::LoteProcessor;

/// Consumes ingestion requests one message at a time
pub struct IngestionQueueWorker {
    pool: sqlx::PgPool,
    queue: PgmqClient,
    claimer: Arc<JobClaimer>,
    processor: Arc<LoteProcessor>,
    config: QueueConfig,
}

impl IngestionQueueWorker {
    pub fn new(
        pool: sqlx::PgPool,
        queue: PgmqClient,
        claimer: Arc<JobClaimer>,
        processor: Arc<LoteProcessor>,
        config: QueueConfig,
    ) -> Self {
        Self {
            pool,
            queue,
            claimer,
            processor,
            config,
        }
    }

    /// Run the consumer loop until the process stops
    pub async fn run(&self) {
        info!(
            queue = %self.config.ingestion_queue,
            poll_interval_ms = self.config.poll_interval_ms,
            "Starting ingestion queue worker"
        );

        loop {
            match self.process_next_message().await {
                Ok(true) => {
                    // Processed a message; poll again immediately
                }
                Ok(false) => {
                    sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                }
                Err(err) => {
                    error!(error = %err, "Queue worker iteration failed");
                    sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                }
            }
        }
    }

    /// Read and handle at most one message.
    ///
    /// Returns whether a message was handled.
    #[instrument(skip(self), fields(queue = %self.config.ingestion_queue))]
    pub async fn process_next_message(&self) -> Result<bool> {
        let mut messages: Vec<Message<IngestionMessage>> = self
            .queue
            .read_batch(
                &self.config.ingestion_queue,
                Some(self.config.visibility_timeout_seconds),
                1,
            )
            .await?;

        let Some(message) = messages.pop() else {
            return Ok(false);
        };

        self.handle_message(message).await?;
        Ok(true)
    }

    async fn handle_message(&self, message: Message<IngestionMessage>) -> Result<()> {
        let request = message.message.clone();
        let queue_name = &self.config.ingestion_queue;

        // Single source of truth: only a successful row claim authorizes work.
        let Some(job) = self.claimer.claim_pending_by_id(request.job_id).await? else {
            debug!(
                job_id = request.job_id,
                msg_id = message.msg_id,
                "Job not pending; dropping already-handled ingestion request"
            );
            self.queue.delete(queue_name, message.msg_id).await?;
            return Ok(());
        };

        match self.processor.process_job(&job).await {
            Ok(summary) => {
                Job::mark_done(&self.pool, job.job_id).await?;
                self.queue.delete(queue_name, message.msg_id).await?;
                info!(
                    event = events::JOB_COMPLETED,
                    job_id = job.job_id,
                    lote_id = summary.lote_id,
                    attempt = request.attempts(),
                    "Queued ingestion completed"
                );
            }
            Err(err) => self.handle_failure(&request, message.msg_id, &err).await?,
        }

        Ok(())
    }

    async fn handle_failure(
        &self,
        request: &IngestionMessage,
        msg_id: i64,
        err: &crate::error::ReconError,
    ) -> Result<()> {
        let queue_name = &self.config.ingestion_queue;

        match request.next_retry() {
            Some(retry) => {
                // Release the claim so the retry can win it again
                self.claimer.release_to_pending(request.job_id).await?;

                let delay = retry.backoff_delay_seconds();
                self.queue.send_delay(queue_name, &retry, delay).await?;
                self.queue.delete(queue_name, msg_id).await?;

                info!(
                    event = events::INGESTION_RETRIED,
                    job_id = request.job_id,
                    attempt = retry.attempts(),
                    delay_seconds = delay,
                    error = %err,
                    "Ingestion failed; retry scheduled"
                );
            }
            None => {
                Job::mark_error(&self.pool, request.job_id, &err.to_string()).await?;
                self.queue.archive(queue_name, msg_id).await?;

                error!(
                    event = events::INGESTION_EXHAUSTED,
                    job_id = request.job_id,
                    attempts = request.attempts(),
                    error = %err,
                    "Ingestion retry policy exhausted; failure recorded on the job"
                );
            }
        }

        Ok(())
    }
}
