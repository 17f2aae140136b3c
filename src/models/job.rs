//! # Job Model
//!
//! One row per unit of scheduled ingestion work. Jobs are created by the
//! scheduler or a manual trigger, claimed under row-level locking by the
//! dispatcher (see `orchestration::job_claimer`), and finished with a
//! terminal `done`/`error` status recorded outside the claim transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::Result;
use crate::models::document::DocumentKind;
use crate::state_machine::JobState;

const JOB_COLUMNS: &str = "job_id, source, document_kind, job_type, status, start_time, \
                           end_time, triggered_by, error, created_at, updated_at";

/// Represents one schedulable ingestion window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub job_id: i64,
    pub source: String,
    pub document_kind: String,
    pub job_type: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub triggered_by: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New job for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub document_kind: DocumentKind,
    pub job_type: JobTrigger,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub triggered_by: Option<String>,
}

/// How a job came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTrigger {
    Auto,
    Manual,
}

impl std::fmt::Display for JobTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

impl Job {
    /// Create a new pending job
    pub async fn create(pool: &PgPool, new_job: NewJob) -> Result<Job> {
        let query = format!(
            "INSERT INTO recon_jobs (source, document_kind, job_type, status, start_time, \
             end_time, triggered_by, created_at, updated_at) \
             VALUES ('pos', $1, $2, 'pending', $3, $4, $5, NOW(), NOW()) \
             RETURNING {JOB_COLUMNS}"
        );

        let job = sqlx::query_as::<_, Job>(&query)
            .bind(new_job.document_kind.as_str())
            .bind(new_job.job_type.to_string())
            .bind(new_job.start_time)
            .bind(new_job.end_time)
            .bind(new_job.triggered_by)
            .fetch_one(pool)
            .await?;

        Ok(job)
    }

    /// Find a job by id
    pub async fn find_by_id(pool: &PgPool, job_id: i64) -> Result<Option<Job>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM recon_jobs WHERE job_id = $1");

        let job = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await?;

        Ok(job)
    }

    /// Record successful completion
    pub async fn mark_done(pool: &PgPool, job_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE recon_jobs SET status = 'done', error = NULL, updated_at = NOW() \
             WHERE job_id = $1",
        )
        .bind(job_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Record a processing failure with its message.
    ///
    /// This runs outside the claim transaction: the claim commit is never
    /// rolled back, the business failure is recorded after the fact.
    pub async fn mark_error(pool: &PgPool, job_id: i64, message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE recon_jobs SET status = 'error', error = $2, updated_at = NOW() \
             WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(message)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Parse the persisted status into a typed state
    pub fn state(&self) -> Result<JobState> {
        self.status
            .parse()
            .map_err(|e: String| crate::error::ReconError::database("job_state", e))
    }

    /// The document kind this job's window covers
    pub fn kind(&self) -> Result<DocumentKind> {
        self.document_kind
            .parse()
            .map_err(|e: String| crate::error::ReconError::database("job_kind", e))
    }
}
