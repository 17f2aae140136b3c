//! # Transaction Registrar
//!
//! Persists one transaction per POS document in status `validation`.
//! Failure isolation is per document: a mapping or persist failure becomes
//! an explicit `Failed` outcome in the batch result and the loop moves on.
//! Whether the batch as a whole may proceed to validation is the caller's
//! decision (the all-or-nothing gate lives in the lote processor).

use sqlx::PgPool;
use tracing::{instrument, warn};

use crate::constants::events;
use crate::error::Result;
use crate::models::document::{DocumentKind, PosDocument};
use crate::models::{NewTransaction, Transaction};
use crate::orchestration::document_mapper::map_document;
use crate::orchestration::types::{BatchRegistration, RegistrationOutcome};

/// Maps raw POS documents into transactions
pub struct TransactionRegistrar {
    pool: PgPool,
}

impl TransactionRegistrar {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register every document in the batch whose discriminator matches
    /// the requested kind.
    ///
    /// Documents of the other kind are skipped; documents with an
    /// unrecognized discriminator are recorded as failures rather than
    /// silently dropped.
    #[instrument(skip(self, documents), fields(lote_id = lote_id, kind = %kind))]
    pub async fn register_batch(
        &self,
        lote_id: i64,
        kind: DocumentKind,
        documents: &[PosDocument],
    ) -> Result<BatchRegistration> {
        let mut batch = BatchRegistration::default();

        for document in documents {
            match document.kind() {
                Ok(document_kind) if document_kind != kind => continue,
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        document_number = %document.document_number,
                        error = %err,
                        "Rejecting document with unrecognized discriminator"
                    );
                    batch.push(RegistrationOutcome::Failed {
                        document_number: document.document_number.clone(),
                        error: err.to_string(),
                    });
                    continue;
                }
            }

            match self.register_document(lote_id, kind, document).await {
                Ok(transaction) => {
                    tracing::debug!(
                        event = events::TRANSACTION_REGISTERED,
                        transaction_id = transaction.transaction_id,
                        document_number = %transaction.document_number,
                        "Registered transaction"
                    );
                    batch.push(RegistrationOutcome::Registered {
                        transaction_id: transaction.transaction_id,
                        document_number: transaction.document_number,
                    });
                }
                Err(err) => {
                    warn!(
                        document_number = %document.document_number,
                        error = %err,
                        "Document registration failed; continuing with batch"
                    );
                    batch.push(RegistrationOutcome::Failed {
                        document_number: document.document_number.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }

    async fn register_document(
        &self,
        lote_id: i64,
        kind: DocumentKind,
        document: &PosDocument,
    ) -> Result<Transaction> {
        let mapped = map_document(kind, document);

        Transaction::create(
            &self.pool,
            NewTransaction {
                lote_id,
                kind,
                document_number: document.document_number.clone(),
                raw_source_data: serde_json::to_value(document)?,
                mapped_core_data: mapped,
            },
        )
        .await
    }
}
