//! # Validation Pipeline
//!
//! Five-stage per-transaction validator. Stages run strictly in order
//! (document type, cost center, contact, items, payments) and each stage's
//! outcome is persisted as soon as it finishes, so partial progress
//! survives anything that goes wrong later.
//!
//! Failure isolation is per transaction: an unexpected error inside one
//! transaction's sequence marks that transaction `failed` and the loop
//! proceeds to the next. The contact stage is the only one that aborts a
//! transaction's remaining stages (when the creation fallback also fails);
//! every other stage failure records its result and continues.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

use crate::clients::accounting::{
    AccountingGateway, ContactPayload, CostCenterRecord, DocumentTypeRecord, ItemPayload,
    ItemRecord,
};
use crate::clients::pos::PosGateway;
use crate::constants::events;
use crate::error::{ReconError, Result};
use crate::models::document::{DocumentKind, MappedDocument, MappedItem};
use crate::models::Transaction;
use crate::orchestration::types::{StageCheck, ValidationStage};

/// Runs the five validation dimensions against the accounting master data
pub struct ValidationPipeline {
    pool: PgPool,
    pos: Arc<dyn PosGateway>,
    accounting: Arc<dyn AccountingGateway>,
}

/// Accounting contact reference carried into the invoice payload
struct ContactReference {
    id: String,
    identification: String,
}

/// Contact stage result; `abort_message` is set when the creation
/// fallback failed and the remaining stages must be skipped.
struct ContactOutcome {
    check: StageCheck,
    reference: Option<ContactReference>,
    abort_message: Option<String>,
}

impl ValidationPipeline {
    pub fn new(
        pool: PgPool,
        pos: Arc<dyn PosGateway>,
        accounting: Arc<dyn AccountingGateway>,
    ) -> Self {
        Self {
            pool,
            pos,
            accounting,
        }
    }

    /// Validate every transaction of a kind currently in `validation`.
    ///
    /// Returns how many transactions were evaluated.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn validate_pending(&self, kind: DocumentKind) -> Result<usize> {
        let transactions = Transaction::find_pending_validation(&self.pool, kind).await?;

        debug!(count = transactions.len(), "Validating pending transactions");

        for transaction in &transactions {
            if let Err(err) = self.validate_transaction(transaction).await {
                warn!(
                    event = events::TRANSACTION_FAILED,
                    transaction_id = transaction.transaction_id,
                    error = %err,
                    "Transaction validation errored; marking failed and continuing"
                );
                Transaction::mark_failed(
                    &self.pool,
                    transaction.transaction_id,
                    Some(&err.to_string()),
                )
                .await?;
            }
        }

        Ok(transactions.len())
    }

    /// Run the five stages for one transaction and settle its status
    async fn validate_transaction(&self, transaction: &Transaction) -> Result<()> {
        let transaction_id = transaction.transaction_id;
        let mapped = transaction.mapped_document()?.ok_or_else(|| {
            ReconError::database("mapped_core_data", "transaction has no mapped core data")
        })?;

        // Stage 1: document type
        let (document_check, document_type) = self.check_document_type(&mapped).await?;
        Transaction::record_stage_check(
            &self.pool,
            transaction_id,
            ValidationStage::Document,
            &document_check,
        )
        .await?;

        // Stage 2: cost center
        let (cost_center_check, cost_center) = self.check_cost_center(&mapped).await?;
        Transaction::record_stage_check(
            &self.pool,
            transaction_id,
            ValidationStage::CostCenter,
            &cost_center_check,
        )
        .await?;

        // Stage 3: contact, the only stage allowed to abort the sequence
        let contact = self.check_contact(&mapped).await?;
        Transaction::record_stage_check(
            &self.pool,
            transaction_id,
            ValidationStage::Contact,
            &contact.check,
        )
        .await?;

        if let Some(message) = contact.abort_message {
            Transaction::mark_failed(&self.pool, transaction_id, Some(&message)).await?;
            info!(
                event = events::TRANSACTION_FAILED,
                transaction_id = transaction_id,
                "Contact creation failed; remaining stages skipped"
            );
            return Ok(());
        }

        // Stage 4: items
        let (items_check, invoice_items) = self.check_items(&mapped).await;
        Transaction::record_stage_check(
            &self.pool,
            transaction_id,
            ValidationStage::Items,
            &items_check,
        )
        .await?;

        // Stage 5: payments
        let (payments_check, invoice_payments) = self.check_payments(&mapped).await;
        Transaction::record_stage_check(
            &self.pool,
            transaction_id,
            ValidationStage::Payments,
            &payments_check,
        )
        .await?;

        // The assembled body is persisted whatever its completeness
        let payload = assemble_invoice_payload(
            &mapped,
            document_type.as_ref(),
            cost_center.as_ref(),
            contact.reference.as_ref(),
            invoice_items,
            invoice_payments,
        );
        Transaction::set_invoice_payload(&self.pool, transaction_id, &payload).await?;

        let overall_success = document_check.is_success()
            && cost_center_check.is_success()
            && contact.check.is_success()
            && items_check.is_success()
            && payments_check.is_success();

        if overall_success {
            Transaction::mark_to_invoice(&self.pool, transaction_id).await?;
            info!(
                event = events::TRANSACTION_VALIDATED,
                transaction_id = transaction_id,
                "Transaction validated; ready to invoice"
            );
        } else {
            Transaction::mark_failed(&self.pool, transaction_id, None).await?;
            info!(
                event = events::TRANSACTION_FAILED,
                transaction_id = transaction_id,
                "Transaction failed validation"
            );
        }

        Ok(())
    }

    async fn check_document_type(
        &self,
        mapped: &MappedDocument,
    ) -> Result<(StageCheck, Option<DocumentTypeRecord>)> {
        let matched = self
            .accounting
            .match_document_type(&mapped.prefix, &mapped.series)
            .await?;

        Ok(match matched {
            Some(record) => (
                StageCheck::success(serde_json::json!({
                    "id": record.id,
                    "prefix": record.prefix,
                    "series": record.series,
                })),
                Some(record),
            ),
            None => (
                StageCheck::failed(serde_json::json!({
                    "message": ReconError::stage_validation(
                        ValidationStage::Document,
                        "no document type matched",
                    )
                    .to_string(),
                    "prefix": mapped.prefix,
                    "series": mapped.series,
                })),
                None,
            ),
        })
    }

    async fn check_cost_center(
        &self,
        mapped: &MappedDocument,
    ) -> Result<(StageCheck, Option<CostCenterRecord>)> {
        let matched = self
            .accounting
            .match_cost_center(&mapped.cost_center_name)
            .await?;

        Ok(match matched {
            Some(record) => (
                StageCheck::success(serde_json::json!({
                    "id": record.id,
                    "name": record.name,
                })),
                Some(record),
            ),
            None => (
                StageCheck::failed(serde_json::json!({
                    "message": ReconError::stage_validation(
                        ValidationStage::CostCenter,
                        "no cost center matched",
                    )
                    .to_string(),
                    "name": mapped.cost_center_name,
                })),
                None,
            ),
        })
    }

    async fn check_contact(&self, mapped: &MappedDocument) -> Result<ContactOutcome> {
        let identification = &mapped.contact_identification;

        if let Some(existing) = self
            .accounting
            .find_contact_by_identification(identification)
            .await?
        {
            return Ok(ContactOutcome {
                check: StageCheck::success(serde_json::json!({
                    "id": existing.id,
                    "identification": existing.identification,
                })),
                reference: Some(ContactReference {
                    id: existing.id,
                    identification: identification.clone(),
                }),
                abort_message: None,
            });
        }

        // Creation fallback: fetch the full record from the POS gateway
        // and create it in the accounting system.
        match self.create_missing_contact(mapped.kind, identification).await {
            Ok(created) => Ok(ContactOutcome {
                check: StageCheck::success(serde_json::json!({
                    "id": created.id,
                    "identification": created.identification,
                    "created": true,
                })),
                reference: Some(ContactReference {
                    id: created.id,
                    identification: identification.clone(),
                }),
                abort_message: None,
            }),
            Err(err) => {
                let failure =
                    ReconError::contact_creation(identification.clone(), err.to_string());
                let message = failure.to_string();
                Ok(ContactOutcome {
                    check: StageCheck::failed(serde_json::json!({
                        "message": message,
                        "identification": identification,
                    })),
                    reference: None,
                    abort_message: Some(message),
                })
            }
        }
    }

    async fn create_missing_contact(
        &self,
        kind: DocumentKind,
        identification: &str,
    ) -> Result<crate::clients::accounting::ContactRecord> {
        let detail = self.pos.fetch_contact_detail(kind, identification).await?;

        self.accounting
            .create_contact(&ContactPayload {
                kind: detail.kind,
                identification: detail.identification,
                name: detail.name,
                address: detail.address,
                phone: detail.phone,
                email: detail.email,
            })
            .await
    }

    /// Items stage: each line is resolved independently; the aggregate
    /// fails if any line neither matches nor can be created. Returns the
    /// re-shaped invoice item list only on aggregate success.
    async fn check_items(
        &self,
        mapped: &MappedDocument,
    ) -> (StageCheck, Option<Vec<serde_json::Value>>) {
        let mut lines = Vec::with_capacity(mapped.items.len());
        let mut resolved = Vec::with_capacity(mapped.items.len());
        let mut all_ok = true;

        for item in &mapped.items {
            match self.resolve_item(item).await {
                Ok(record) => {
                    lines.push(serde_json::json!({
                        "code": item.code,
                        "id": record.id,
                        "status": "success",
                    }));
                    resolved.push((item, record));
                }
                Err(err) => {
                    all_ok = false;
                    lines.push(serde_json::json!({
                        "code": item.code,
                        "status": "failed",
                        "error": err.to_string(),
                    }));
                }
            }
        }

        let details = serde_json::json!({ "lines": lines });
        if !all_ok {
            return (StageCheck::failed(details), None);
        }

        let invoice_items = resolved
            .into_iter()
            .map(|(item, record)| reshape_invoice_item(item, &record))
            .collect();

        (StageCheck::success(details), Some(invoice_items))
    }

    async fn resolve_item(&self, item: &MappedItem) -> Result<ItemRecord> {
        if let Some(existing) = self.accounting.find_item_by_code(&item.code).await? {
            return Ok(existing);
        }

        self.accounting
            .create_item(&ItemPayload {
                code: item.code.clone(),
                description: item.description.clone(),
                unit_price: item.unit_price,
            })
            .await
    }

    /// Payments stage: each line resolves its payment method by name;
    /// a miss marks that line failed and the stage continues.
    async fn check_payments(
        &self,
        mapped: &MappedDocument,
    ) -> (StageCheck, Vec<serde_json::Value>) {
        let mut lines = Vec::with_capacity(mapped.payments.len());
        let mut invoice_payments = Vec::with_capacity(mapped.payments.len());
        let mut all_ok = true;

        for payment in &mapped.payments {
            let found = self
                .accounting
                .find_payment_method(&mapped.prefix, &payment.method_name)
                .await;

            match found {
                Ok(Some(record)) => {
                    lines.push(serde_json::json!({
                        "name": payment.method_name,
                        "id": record.id,
                        "status": "success",
                    }));
                    invoice_payments.push(serde_json::json!({
                        "id": record.id,
                        "value": payment.value,
                    }));
                }
                Ok(None) => {
                    all_ok = false;
                    lines.push(serde_json::json!({
                        "name": payment.method_name,
                        "status": "failed",
                        "error": "payment method not found",
                    }));
                }
                Err(err) => {
                    all_ok = false;
                    lines.push(serde_json::json!({
                        "name": payment.method_name,
                        "status": "failed",
                        "error": err.to_string(),
                    }));
                }
            }
        }

        let details = serde_json::json!({ "lines": lines });
        let check = if all_ok {
            StageCheck::success(details)
        } else {
            StageCheck::failed(details)
        };

        (check, invoice_payments)
    }
}

fn reshape_invoice_item(item: &MappedItem, record: &ItemRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.id,
        "code": item.code,
        "description": item.description,
        "quantity": item.quantity,
        "price": item.unit_price,
        "total": item.total,
    })
}

/// Assemble the invoice submission body from whatever the stages resolved.
///
/// The item list is attached only when the items aggregate succeeded; the
/// counter-party key is `supplier` for purchases and `customer` for sales.
fn assemble_invoice_payload(
    mapped: &MappedDocument,
    document_type: Option<&DocumentTypeRecord>,
    cost_center: Option<&CostCenterRecord>,
    contact: Option<&ContactReference>,
    invoice_items: Option<Vec<serde_json::Value>>,
    invoice_payments: Vec<serde_json::Value>,
) -> serde_json::Value {
    let contact_key = match mapped.kind {
        DocumentKind::Purchases => "supplier",
        DocumentKind::Sales => "customer",
    };

    let mut payload = serde_json::json!({
        "document": document_type
            .map(|dt| serde_json::json!({"id": dt.id}))
            .unwrap_or(serde_json::Value::Null),
        "number": mapped.document_number,
        "date": mapped.date.format("%Y-%m-%d").to_string(),
        "costCenter": cost_center
            .map(|cc| serde_json::Value::String(cc.id.clone()))
            .unwrap_or(serde_json::Value::Null),
        "payments": invoice_payments,
        "total": mapped.total,
    });

    payload[contact_key] = contact
        .map(|c| {
            serde_json::json!({
                "id": c.id,
                "identification": c.identification,
            })
        })
        .unwrap_or(serde_json::Value::Null);

    if let Some(items) = invoice_items {
        payload["items"] = serde_json::Value::Array(items);
    }

    payload
}
