//! # Invoice Synchronizer
//!
//! Submits validated transactions as invoices. The selection filter is
//! status `to_invoice`, so transactions already in `success` are naturally
//! excluded; running the synchronizer twice never resubmits an invoice.
//! Each transaction is independent: one submission failure neither blocks
//! nor retries the others in the same pass.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

use crate::clients::accounting::AccountingGateway;
use crate::constants::events;
use crate::error::{ReconError, Result};
use crate::models::document::DocumentKind;
use crate::models::Transaction;

/// Drives `to_invoice` transactions to their terminal state
pub struct InvoiceSynchronizer {
    pool: PgPool,
    accounting: Arc<dyn AccountingGateway>,
}

impl InvoiceSynchronizer {
    pub fn new(pool: PgPool, accounting: Arc<dyn AccountingGateway>) -> Self {
        Self { pool, accounting }
    }

    /// Submit every transaction of a kind currently in `to_invoice`.
    ///
    /// Returns how many submissions were attempted.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn sync_pending(&self, kind: DocumentKind) -> Result<usize> {
        let transactions = Transaction::find_to_invoice(&self.pool, kind).await?;

        debug!(count = transactions.len(), "Submitting validated transactions");

        for transaction in &transactions {
            self.submit_transaction(transaction).await?;
        }

        Ok(transactions.len())
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<()> {
        let transaction_id = transaction.transaction_id;

        let payload = match &transaction.invoice_payload {
            Some(payload) => payload.clone(),
            None => {
                let err = ReconError::database(
                    "invoice_payload",
                    "transaction reached to_invoice without an assembled payload",
                );
                Transaction::mark_failed(&self.pool, transaction_id, Some(&err.to_string()))
                    .await?;
                return Ok(());
            }
        };

        match self.accounting.create_invoice(&payload).await {
            Ok(response) => {
                Transaction::mark_success(&self.pool, transaction_id, &response).await?;
                info!(
                    event = events::INVOICE_SUBMITTED,
                    transaction_id = transaction_id,
                    "Invoice accepted by accounting gateway"
                );
            }
            Err(err) => {
                warn!(
                    event = events::INVOICE_REJECTED,
                    transaction_id = transaction_id,
                    error = %err,
                    "Invoice submission failed; continuing with remaining transactions"
                );
                Transaction::mark_failed(&self.pool, transaction_id, Some(&err.to_string()))
                    .await?;
            }
        }

        Ok(())
    }
}
