//! # Transaction Model
//!
//! One row per POS document under reconciliation. The five `*_check`
//! JSONB columns carry the per-dimension audit trail written stage by
//! stage, so a transaction always shows why it did or did not become an
//! invoice. Status transitions are guarded in SQL: each advance predicates
//! on the expected current status, so an already-terminal row is never
//! moved again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Row};

use crate::error::Result;
use crate::models::document::{DocumentKind, MappedDocument};
use crate::orchestration::types::{StageCheck, ValidationStage};
use crate::state_machine::TransactionState;

const TRANSACTION_COLUMNS: &str =
    "transaction_id, lote_id, transaction_type, document_number, raw_source_data, \
     mapped_core_data, document_check, cost_center_check, contact_check, items_check, \
     payments_check, invoice_payload, invoice_response, error, status, deleted_at, \
     created_at, updated_at";

/// Represents one POS document moving through the reconciliation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub transaction_id: i64,
    pub lote_id: i64,
    pub transaction_type: String,
    pub document_number: String,
    pub raw_source_data: serde_json::Value,
    pub mapped_core_data: Option<serde_json::Value>,
    pub document_check: Option<serde_json::Value>,
    pub cost_center_check: Option<serde_json::Value>,
    pub contact_check: Option<serde_json::Value>,
    pub items_check: Option<serde_json::Value>,
    pub payments_check: Option<serde_json::Value>,
    pub invoice_payload: Option<serde_json::Value>,
    pub invoice_response: Option<serde_json::Value>,
    pub error: Option<String>,
    pub status: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New transaction for creation; always enters the pipeline in `validation`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub lote_id: i64,
    pub kind: DocumentKind,
    pub document_number: String,
    pub raw_source_data: serde_json::Value,
    pub mapped_core_data: MappedDocument,
}

impl Transaction {
    /// Persist a freshly mapped document in `validation`
    pub async fn create(pool: &PgPool, new_transaction: NewTransaction) -> Result<Transaction> {
        let mapped = serde_json::to_value(&new_transaction.mapped_core_data)?;

        let query = format!(
            "INSERT INTO recon_transactions (lote_id, transaction_type, document_number, \
             raw_source_data, mapped_core_data, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, 'validation', NOW(), NOW()) \
             RETURNING {TRANSACTION_COLUMNS}"
        );

        let transaction = sqlx::query_as::<_, Transaction>(&query)
            .bind(new_transaction.lote_id)
            .bind(new_transaction.kind.as_str())
            .bind(new_transaction.document_number)
            .bind(new_transaction.raw_source_data)
            .bind(mapped)
            .fetch_one(pool)
            .await?;

        Ok(transaction)
    }

    /// Find a transaction by id (excludes soft-deleted rows)
    pub async fn find_by_id(pool: &PgPool, transaction_id: i64) -> Result<Option<Transaction>> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM recon_transactions \
             WHERE transaction_id = $1 AND deleted_at IS NULL"
        );

        let transaction = sqlx::query_as::<_, Transaction>(&query)
            .bind(transaction_id)
            .fetch_optional(pool)
            .await?;

        Ok(transaction)
    }

    /// All transactions of a kind still awaiting validation
    pub async fn find_pending_validation(
        pool: &PgPool,
        kind: DocumentKind,
    ) -> Result<Vec<Transaction>> {
        Self::find_by_kind_and_status(pool, kind, "validation").await
    }

    /// All transactions of a kind validated and awaiting invoice submission
    pub async fn find_to_invoice(pool: &PgPool, kind: DocumentKind) -> Result<Vec<Transaction>> {
        Self::find_by_kind_and_status(pool, kind, "to_invoice").await
    }

    /// All live transactions belonging to one lote
    pub async fn find_by_lote(pool: &PgPool, lote_id: i64) -> Result<Vec<Transaction>> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM recon_transactions \
             WHERE lote_id = $1 AND deleted_at IS NULL \
             ORDER BY transaction_id ASC"
        );

        let transactions = sqlx::query_as::<_, Transaction>(&query)
            .bind(lote_id)
            .fetch_all(pool)
            .await?;

        Ok(transactions)
    }

    async fn find_by_kind_and_status(
        pool: &PgPool,
        kind: DocumentKind,
        status: &str,
    ) -> Result<Vec<Transaction>> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM recon_transactions \
             WHERE transaction_type = $1 AND status = $2 AND deleted_at IS NULL \
             ORDER BY transaction_id ASC"
        );

        let transactions = sqlx::query_as::<_, Transaction>(&query)
            .bind(kind.as_str())
            .bind(status)
            .fetch_all(pool)
            .await?;

        Ok(transactions)
    }

    /// Persist one stage's outcome independently of the other stages.
    ///
    /// Partial progress must survive a later stage's failure, so each
    /// stage writes its own column as soon as it finishes.
    pub async fn record_stage_check(
        pool: &PgPool,
        transaction_id: i64,
        stage: ValidationStage,
        check: &StageCheck,
    ) -> Result<()> {
        let column = match stage {
            ValidationStage::Document => "document_check",
            ValidationStage::CostCenter => "cost_center_check",
            ValidationStage::Contact => "contact_check",
            ValidationStage::Items => "items_check",
            ValidationStage::Payments => "payments_check",
        };

        let query = format!(
            "UPDATE recon_transactions SET {column} = $2, updated_at = NOW() \
             WHERE transaction_id = $1 AND deleted_at IS NULL"
        );

        sqlx::query(&query)
            .bind(transaction_id)
            .bind(serde_json::to_value(check)?)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Read back one stage's persisted outcome
    pub fn stage_check(&self, stage: ValidationStage) -> Result<Option<StageCheck>> {
        let raw = match stage {
            ValidationStage::Document => &self.document_check,
            ValidationStage::CostCenter => &self.cost_center_check,
            ValidationStage::Contact => &self.contact_check,
            ValidationStage::Items => &self.items_check,
            ValidationStage::Payments => &self.payments_check,
        };

        match raw {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Persist the assembled invoice submission body (whatever its
    /// completeness)
    pub async fn set_invoice_payload(
        pool: &PgPool,
        transaction_id: i64,
        payload: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE recon_transactions SET invoice_payload = $2, updated_at = NOW() \
             WHERE transaction_id = $1 AND deleted_at IS NULL",
        )
        .bind(transaction_id)
        .bind(payload)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Advance `validation` → `to_invoice`; a row in any other status is
    /// left untouched.
    pub async fn mark_to_invoice(pool: &PgPool, transaction_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE recon_transactions SET status = 'to_invoice', updated_at = NOW() \
             WHERE transaction_id = $1 AND status = 'validation' AND deleted_at IS NULL",
        )
        .bind(transaction_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Advance to terminal `failed` from either non-terminal status.
    ///
    /// `message` is recorded for runtime errors; plain validation
    /// failures pass `None`; their reasons already live in the check
    /// columns.
    pub async fn mark_failed(
        pool: &PgPool,
        transaction_id: i64,
        message: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE recon_transactions SET status = 'failed', error = $2, updated_at = NOW() \
             WHERE transaction_id = $1 AND status IN ('validation', 'to_invoice') \
             AND deleted_at IS NULL",
        )
        .bind(transaction_id)
        .bind(message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Advance `to_invoice` → `success`, storing the accounting system's
    /// raw invoice response. A transaction already in `success` is never
    /// resubmitted because the predicate only matches `to_invoice`.
    pub async fn mark_success(
        pool: &PgPool,
        transaction_id: i64,
        invoice_response: &serde_json::Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE recon_transactions SET status = 'success', invoice_response = $2, \
             error = NULL, updated_at = NOW() \
             WHERE transaction_id = $1 AND status = 'to_invoice' AND deleted_at IS NULL",
        )
        .bind(transaction_id)
        .bind(invoice_response)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Status distribution for one lote, used to finalize the run
    pub async fn status_counts_for_lote(
        pool: &PgPool,
        lote_id: i64,
    ) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS total FROM recon_transactions \
             WHERE lote_id = $1 AND deleted_at IS NULL GROUP BY status",
        )
        .bind(lote_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("status"), row.get::<i64, _>("total")))
            .collect())
    }

    /// Logical delete: the row is hidden from queries, not removed
    pub async fn soft_delete(pool: &PgPool, transaction_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE recon_transactions SET deleted_at = NOW(), updated_at = NOW() \
             WHERE transaction_id = $1 AND deleted_at IS NULL",
        )
        .bind(transaction_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Parse the persisted status into a typed state
    pub fn state(&self) -> Result<TransactionState> {
        self.status
            .parse()
            .map_err(|e: String| crate::error::ReconError::database("transaction_state", e))
    }

    /// Decode the accounting-shaped projection this row was registered with
    pub fn mapped_document(&self) -> Result<Option<MappedDocument>> {
        match &self.mapped_core_data {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }
}
