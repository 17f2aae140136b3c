//! # Ingestion Queue Boundary
//!
//! The second dispatch path: producers enqueue ingestion requests for
//! specific jobs, and the queue worker consumes them under the queue-level
//! retry policy (3 attempts, exponential backoff from 5 seconds). The
//! polling dispatcher and this path share one source of truth (the job
//! row claim), so overlapping deliveries never double-process a job.

pub mod message;
pub mod pgmq_client;

pub use message::{IngestionMessage, IngestionMessageMetadata};
pub use pgmq_client::PgmqClient;

use crate::config::QueueConfig;
use crate::constants::events;
use crate::error::Result;
use tracing::info;

/// Enqueue an ingestion request for a pending job
pub async fn enqueue_ingestion(
    client: &PgmqClient,
    config: &QueueConfig,
    job_id: i64,
) -> Result<i64> {
    let message = IngestionMessage::new(job_id, config);
    let message_id = client.send(&config.ingestion_queue, &message).await?;

    info!(
        event = events::INGESTION_ENQUEUED,
        job_id = job_id,
        msg_id = message_id,
        "Ingestion request enqueued"
    );

    Ok(message_id)
}
