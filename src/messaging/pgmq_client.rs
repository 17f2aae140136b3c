//! # PostgreSQL Message Queue Client
//!
//! Thin wrapper around the pgmq crate for the ingestion queue. Shares the
//! worker's sqlx pool and maps queue failures into the crate error type.

use pgmq::{types::Message, PGMQueue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ReconError, Result};

/// pgmq-backed message queue client
#[derive(Clone)]
pub struct PgmqClient {
    pgmq: PGMQueue,
}

impl PgmqClient {
    /// Create a client on an existing connection pool
    pub async fn new_with_pool(pool: sqlx::PgPool) -> Self {
        let pgmq = PGMQueue::new_with_pool(pool).await;
        Self { pgmq }
    }

    /// Create the queue if it doesn't exist
    pub async fn create_queue(&self, queue_name: &str) -> Result<()> {
        self.pgmq
            .create(queue_name)
            .await
            .map_err(|e| ReconError::messaging(queue_name, "create", e.to_string()))?;

        debug!(queue = queue_name, "Queue ready");
        Ok(())
    }

    /// Send a message for immediate delivery
    pub async fn send<T: Serialize>(&self, queue_name: &str, message: &T) -> Result<i64> {
        let message_id = self
            .pgmq
            .send(queue_name, message)
            .await
            .map_err(|e| ReconError::messaging(queue_name, "send", e.to_string()))?;

        debug!(queue = queue_name, msg_id = message_id, "Message sent");
        Ok(message_id)
    }

    /// Send a message that becomes visible after `delay_seconds`
    pub async fn send_delay<T: Serialize>(
        &self,
        queue_name: &str,
        message: &T,
        delay_seconds: u64,
    ) -> Result<i64> {
        let message_id = self
            .pgmq
            .send_delay(queue_name, message, delay_seconds)
            .await
            .map_err(|e| ReconError::messaging(queue_name, "send_delay", e.to_string()))?;

        debug!(
            queue = queue_name,
            msg_id = message_id,
            delay_seconds = delay_seconds,
            "Delayed message sent"
        );
        Ok(message_id)
    }

    /// Read up to `limit` messages under a visibility timeout
    pub async fn read_batch<T: DeserializeOwned>(
        &self,
        queue_name: &str,
        visibility_timeout: Option<i32>,
        limit: i32,
    ) -> Result<Vec<Message<T>>> {
        let messages = self
            .pgmq
            .read_batch(queue_name, visibility_timeout, limit)
            .await
            .map_err(|e| ReconError::messaging(queue_name, "read_batch", e.to_string()))?
            .unwrap_or_default();

        Ok(messages)
    }

    /// Delete a processed message
    pub async fn delete(&self, queue_name: &str, message_id: i64) -> Result<()> {
        self.pgmq
            .delete(queue_name, message_id)
            .await
            .map_err(|e| ReconError::messaging(queue_name, "delete", e.to_string()))?;

        Ok(())
    }

    /// Archive a message (retry policy exhausted)
    pub async fn archive(&self, queue_name: &str, message_id: i64) -> Result<()> {
        self.pgmq
            .archive(queue_name, message_id)
            .await
            .map_err(|e| ReconError::messaging(queue_name, "archive", e.to_string()))?;

        Ok(())
    }
}
