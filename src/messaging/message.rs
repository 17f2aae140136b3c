//! Ingestion queue message shapes.
//!
//! The queue contract carries its retry policy in message metadata:
//! 3 attempts with exponential backoff starting at 5 seconds. The queue
//! worker re-enqueues a failed message with the next delay until the
//! attempts are exhausted, then archives it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::QueueConfig;

/// Queue message requesting ingestion for one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionMessage {
    pub job_id: i64,
    pub metadata: IngestionMessageMetadata,
}

/// Metadata for ingestion messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionMessageMetadata {
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: i32,
    pub max_attempts: i32,
    pub backoff_base_seconds: u64,
}

impl IngestionMessage {
    /// Build a first-attempt message under the configured retry policy
    pub fn new(job_id: i64, config: &QueueConfig) -> Self {
        Self {
            job_id,
            metadata: IngestionMessageMetadata {
                enqueued_at: Utc::now(),
                retry_count: 0,
                max_attempts: config.max_attempts,
                backoff_base_seconds: config.base_delay_seconds,
            },
        }
    }

    /// Attempts consumed so far (the initial delivery counts as one)
    pub fn attempts(&self) -> i32 {
        self.metadata.retry_count + 1
    }

    /// The follow-up message for one more attempt, or `None` when the
    /// policy is exhausted.
    pub fn next_retry(&self) -> Option<IngestionMessage> {
        if self.attempts() >= self.metadata.max_attempts {
            return None;
        }

        let mut next = self.clone();
        next.metadata.retry_count += 1;
        next.metadata.enqueued_at = Utc::now();
        Some(next)
    }

    /// Exponential backoff delay for this delivery:
    /// base * 2^(retry_count - 1), so retries wait 5s, 10s, 20s, ...
    pub fn backoff_delay_seconds(&self) -> u64 {
        if self.metadata.retry_count <= 0 {
            return 0;
        }
        self.metadata.backoff_base_seconds << (self.metadata.retry_count - 1)
    }
}
