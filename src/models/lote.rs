//! # Lote Model
//!
//! One row per ingestion run. A lote is created when ingestion starts and
//! finalized once registration, validation and synchronization have run
//! (or failed at batch level). Lotes are soft-deletable: queries filter
//! `deleted_at IS NULL` and deletion stamps the column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::Result;
use crate::models::document::DocumentKind;
use crate::state_machine::LoteState;

const LOTE_COLUMNS: &str = "lote_id, job_id, lote_type, filter, status, error, processed_at, \
                            transactions_count, deleted_at, created_at, updated_at";

/// Represents one ingestion run's container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lote {
    pub lote_id: i64,
    pub job_id: Option<i64>,
    pub lote_type: String,
    pub filter: serde_json::Value,
    pub status: String,
    pub error: Option<serde_json::Value>,
    pub processed_at: Option<DateTime<Utc>>,
    pub transactions_count: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New lote for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLote {
    pub job_id: Option<i64>,
    pub kind: DocumentKind,
    /// The date-window/criteria this run used against the POS export
    pub filter: serde_json::Value,
}

impl Lote {
    /// Create a new lote in `processing`
    pub async fn create(pool: &PgPool, new_lote: NewLote) -> Result<Lote> {
        let query = format!(
            "INSERT INTO recon_lotes (job_id, lote_type, filter, status, created_at, updated_at) \
             VALUES ($1, $2, $3, 'processing', NOW(), NOW()) \
             RETURNING {LOTE_COLUMNS}"
        );

        let lote = sqlx::query_as::<_, Lote>(&query)
            .bind(new_lote.job_id)
            .bind(new_lote.kind.as_str())
            .bind(new_lote.filter)
            .fetch_one(pool)
            .await?;

        Ok(lote)
    }

    /// Find a lote by id (excludes soft-deleted rows)
    pub async fn find_by_id(pool: &PgPool, lote_id: i64) -> Result<Option<Lote>> {
        let query = format!(
            "SELECT {LOTE_COLUMNS} FROM recon_lotes WHERE lote_id = $1 AND deleted_at IS NULL"
        );

        let lote = sqlx::query_as::<_, Lote>(&query)
            .bind(lote_id)
            .fetch_optional(pool)
            .await?;

        Ok(lote)
    }

    /// Record how many transactions this run registered
    pub async fn set_transactions_count(pool: &PgPool, lote_id: i64, count: i32) -> Result<()> {
        sqlx::query(
            "UPDATE recon_lotes SET transactions_count = $2, updated_at = NOW() \
             WHERE lote_id = $1 AND deleted_at IS NULL",
        )
        .bind(lote_id)
        .bind(count)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Finalize the run: terminal status, structured error detail (if
    /// any) and the processing timestamp.
    pub async fn finalize(
        pool: &PgPool,
        lote_id: i64,
        state: LoteState,
        error: Option<serde_json::Value>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE recon_lotes SET status = $2, error = $3, processed_at = NOW(), \
             updated_at = NOW() WHERE lote_id = $1 AND deleted_at IS NULL",
        )
        .bind(lote_id)
        .bind(state.to_string())
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Logical delete: the row is hidden from queries, not removed
    pub async fn soft_delete(pool: &PgPool, lote_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE recon_lotes SET deleted_at = NOW(), updated_at = NOW() \
             WHERE lote_id = $1 AND deleted_at IS NULL",
        )
        .bind(lote_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Parse the persisted status into a typed state
    pub fn state(&self) -> Result<LoteState> {
        self.status
            .parse()
            .map_err(|e: String| crate::error::ReconError::database("lote_state", e))
    }
}
