//! # Lote Processor
//!
//! The ingestion sequence for one claimed job: create the lote, fetch the
//! POS export for the job's window, register the documents, apply the
//! all-or-nothing registration gate, run validation and synchronization,
//! and finalize the lote status from the resulting transaction states.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::clients::pos::{DateWindow, PosGateway};
use crate::constants::events;
use crate::error::Result;
use crate::models::{Job, Lote, NewLote, Transaction};
use crate::orchestration::invoice_synchronizer::InvoiceSynchronizer;
use crate::orchestration::registrar::TransactionRegistrar;
use crate::orchestration::types::{ProcessingSummary, RegistrationOutcome};
use crate::orchestration::validation_pipeline::ValidationPipeline;
use crate::state_machine::LoteState;

/// Runs ingestion → registration → validation → synchronization for one job
pub struct LoteProcessor {
    pool: PgPool,
    pos: Arc<dyn PosGateway>,
    registrar: TransactionRegistrar,
    pipeline: ValidationPipeline,
    synchronizer: InvoiceSynchronizer,
}

impl LoteProcessor {
    pub fn new(
        pool: PgPool,
        pos: Arc<dyn PosGateway>,
        registrar: TransactionRegistrar,
        pipeline: ValidationPipeline,
        synchronizer: InvoiceSynchronizer,
    ) -> Self {
        Self {
            pool,
            pos,
            registrar,
            pipeline,
            synchronizer,
        }
    }

    /// Process one claimed job to completion.
    ///
    /// An `Err` here is recorded on the job by the caller; the lote has
    /// already been finalized as `failed` by then.
    #[instrument(skip(self, job), fields(job_id = job.job_id))]
    pub async fn process_job(&self, job: &Job) -> Result<ProcessingSummary> {
        let kind = job.kind()?;
        let window = DateWindow {
            start: job.start_time,
            end: job.end_time,
        };

        let lote = Lote::create(
            &self.pool,
            NewLote {
                job_id: Some(job.job_id),
                kind,
                filter: serde_json::json!({
                    "document_kind": kind,
                    "start": window.start,
                    "end": window.end,
                }),
            },
        )
        .await?;

        info!(
            event = events::LOTE_CREATED,
            lote_id = lote.lote_id,
            kind = %kind,
            "Lote created for ingestion window"
        );

        let documents = match self.pos.fetch_export(kind, &window).await {
            Ok(documents) => documents,
            Err(err) => {
                Lote::finalize(
                    &self.pool,
                    lote.lote_id,
                    LoteState::Failed,
                    Some(serde_json::json!({ "message": err.to_string() })),
                )
                .await?;
                return Err(err);
            }
        };

        let batch = self
            .registrar
            .register_batch(lote.lote_id, kind, &documents)
            .await?;

        Lote::set_transactions_count(&self.pool, lote.lote_id, batch.registered_count() as i32)
            .await?;

        // All-or-nothing gate: a single failed document suppresses
        // validation/sync for the entire batch, even though the other
        // transactions were already persisted.
        if batch.has_failures() {
            let failures: Vec<serde_json::Value> = batch
                .failures()
                .into_iter()
                .map(|outcome| match outcome {
                    RegistrationOutcome::Failed {
                        document_number,
                        error,
                    } => serde_json::json!({
                        "document_number": document_number,
                        "error": error,
                    }),
                    RegistrationOutcome::Registered { .. } => serde_json::Value::Null,
                })
                .collect();

            warn!(
                lote_id = lote.lote_id,
                failures = failures.len(),
                "Registration failures; validation and sync suppressed for this lote"
            );

            Lote::finalize(
                &self.pool,
                lote.lote_id,
                LoteState::Failed,
                Some(serde_json::json!({
                    "message": "registration failures suppressed validation and sync",
                    "failures": failures,
                })),
            )
            .await?;

            return Ok(ProcessingSummary {
                lote_id: lote.lote_id,
                fetched: documents.len(),
                registered: batch.registered_count(),
                registration_failures: batch.failures().len(),
                gate_tripped: true,
                succeeded: 0,
                failed: 0,
            });
        }

        self.pipeline.validate_pending(kind).await?;
        self.synchronizer.sync_pending(kind).await?;

        let counts = Transaction::status_counts_for_lote(&self.pool, lote.lote_id).await?;
        let succeeded = count_for(&counts, "success");
        let failed = count_for(&counts, "failed");

        let final_state = if failed == 0 {
            LoteState::Success
        } else {
            LoteState::ProcessedWithErrors
        };

        Lote::finalize(&self.pool, lote.lote_id, final_state, None).await?;

        info!(
            event = events::LOTE_FINALIZED,
            lote_id = lote.lote_id,
            status = %final_state,
            succeeded = succeeded,
            failed = failed,
            "Lote finalized"
        );

        Ok(ProcessingSummary {
            lote_id: lote.lote_id,
            fetched: documents.len(),
            registered: batch.registered_count(),
            registration_failures: 0,
            gate_tripped: false,
            succeeded,
            failed,
        })
    }
}

fn count_for(counts: &[(String, i64)], status: &str) -> i64 {
    counts
        .iter()
        .find(|(s, _)| s == status)
        .map(|(_, n)| *n)
        .unwrap_or(0)
}
