#![allow(dead_code)]

//! Shared fixtures for the integration tests: in-memory gateway fakes
//! with configurable master data and failure switches, plus document
//! builders.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use recon_core::clients::accounting::{
    AccountingGateway, ContactPayload, ContactRecord, CostCenterRecord, DocumentTypeRecord,
    ItemPayload, ItemRecord, PaymentMethodRecord,
};
use recon_core::clients::pos::{DateWindow, PosGateway, PosSession};
use recon_core::error::{ReconError, Result};
use recon_core::models::document::{
    DocumentKind, PosContactDetail, PosCounterparty, PosDocument, PosLineItem, PosPaymentLine,
};

/// POS gateway fake serving a canned document batch
pub struct MockPosGateway {
    pub documents: Vec<PosDocument>,
    pub fail_export: bool,
    pub fail_contact_fetch: bool,
}

impl MockPosGateway {
    pub fn with_documents(documents: Vec<PosDocument>) -> Self {
        Self {
            documents,
            fail_export: false,
            fail_contact_fetch: false,
        }
    }
}

#[async_trait]
impl PosGateway for MockPosGateway {
    async fn authenticate(&self) -> Result<PosSession> {
        Ok(PosSession {
            token: "mock-token".to_string(),
            base_address: "http://pos.mock".to_string(),
        })
    }

    async fn fetch_export(
        &self,
        kind: DocumentKind,
        _window: &DateWindow,
    ) -> Result<Vec<PosDocument>> {
        if self.fail_export {
            return Err(ReconError::gateway("pos", 503, "export unavailable"));
        }
        let _ = kind;
        Ok(self.documents.clone())
    }

    async fn fetch_contact_detail(
        &self,
        _kind: DocumentKind,
        identification: &str,
    ) -> Result<PosContactDetail> {
        if self.fail_contact_fetch {
            return Err(ReconError::gateway("pos", 500, "contact lookup failed"));
        }
        Ok(PosContactDetail {
            kind: "third_party".to_string(),
            identification: identification.to_string(),
            name: format!("Contact {identification}"),
            address: None,
            phone: None,
            email: None,
        })
    }
}

/// Accounting gateway fake over in-memory master data
pub struct MockAccountingGateway {
    pub document_types: Vec<DocumentTypeRecord>,
    pub cost_centers: Vec<CostCenterRecord>,
    pub contacts: Vec<ContactRecord>,
    pub items: Vec<ItemRecord>,
    pub payment_methods: Vec<PaymentMethodRecord>,
    /// Identifications whose contact creation is rejected
    pub failing_contact_creations: HashSet<String>,
    /// Item codes whose creation is rejected
    pub failing_item_creations: HashSet<String>,
    pub fail_invoice_creation: bool,
    pub created_contacts: Mutex<Vec<ContactPayload>>,
    pub created_items: Mutex<Vec<ItemPayload>>,
    pub submitted_invoices: Mutex<Vec<serde_json::Value>>,
}

impl MockAccountingGateway {
    /// Master data that matches everything [`sample_document`] produces
    pub fn with_full_master_data() -> Self {
        Self {
            document_types: vec![
                DocumentTypeRecord {
                    id: "DT-FC".to_string(),
                    prefix: "FC".to_string(),
                    series: "A".to_string(),
                },
                DocumentTypeRecord {
                    id: "DT-FV".to_string(),
                    prefix: "FV".to_string(),
                    series: "A".to_string(),
                },
            ],
            cost_centers: vec![CostCenterRecord {
                id: "CC-1".to_string(),
                name: "Sede Centro".to_string(),
            }],
            contacts: Vec::new(),
            items: vec![ItemRecord {
                id: "I-1".to_string(),
                code: "SKU-001".to_string(),
                description: Some("Cafe 500g".to_string()),
            }],
            payment_methods: vec![
                PaymentMethodRecord {
                    id: "PM-1".to_string(),
                    name: "Efectivo".to_string(),
                },
                PaymentMethodRecord {
                    id: "PM-2".to_string(),
                    name: "Transferencia".to_string(),
                },
            ],
            failing_contact_creations: HashSet::new(),
            failing_item_creations: HashSet::new(),
            fail_invoice_creation: false,
            created_contacts: Mutex::new(Vec::new()),
            created_items: Mutex::new(Vec::new()),
            submitted_invoices: Mutex::new(Vec::new()),
        }
    }

    pub fn submitted_invoice_count(&self) -> usize {
        self.submitted_invoices.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountingGateway for MockAccountingGateway {
    async fn match_document_type(
        &self,
        prefix: &str,
        series: &str,
    ) -> Result<Option<DocumentTypeRecord>> {
        Ok(self
            .document_types
            .iter()
            .find(|dt| dt.prefix == prefix && dt.series == series)
            .cloned())
    }

    async fn match_cost_center(&self, name: &str) -> Result<Option<CostCenterRecord>> {
        Ok(self.cost_centers.iter().find(|cc| cc.name == name).cloned())
    }

    async fn find_contact_by_identification(
        &self,
        identification: &str,
    ) -> Result<Option<ContactRecord>> {
        Ok(self
            .contacts
            .iter()
            .find(|c| c.identification == identification)
            .cloned())
    }

    async fn create_contact(&self, payload: &ContactPayload) -> Result<ContactRecord> {
        if self.failing_contact_creations.contains(&payload.identification) {
            return Err(ReconError::gateway(
                "accounting",
                422,
                "contact rejected by upstream",
            ));
        }

        self.created_contacts.lock().unwrap().push(payload.clone());

        Ok(ContactRecord {
            id: "C-55".to_string(),
            identification: payload.identification.clone(),
            name: payload.name.clone(),
        })
    }

    async fn find_item_by_code(&self, code: &str) -> Result<Option<ItemRecord>> {
        Ok(self.items.iter().find(|i| i.code == code).cloned())
    }

    async fn create_item(&self, payload: &ItemPayload) -> Result<ItemRecord> {
        if self.failing_item_creations.contains(&payload.code) {
            return Err(ReconError::gateway(
                "accounting",
                422,
                "item rejected by upstream",
            ));
        }

        self.created_items.lock().unwrap().push(payload.clone());

        Ok(ItemRecord {
            id: format!("I-{}", payload.code),
            code: payload.code.clone(),
            description: Some(payload.description.clone()),
        })
    }

    async fn find_payment_method(
        &self,
        _prefix: &str,
        name: &str,
    ) -> Result<Option<PaymentMethodRecord>> {
        Ok(self
            .payment_methods
            .iter()
            .find(|pm| pm.name == name)
            .cloned())
    }

    async fn create_invoice(&self, payload: &serde_json::Value) -> Result<serde_json::Value> {
        if self.fail_invoice_creation {
            return Err(ReconError::gateway(
                "accounting",
                500,
                "invoice rejected by upstream",
            ));
        }

        let mut invoices = self.submitted_invoices.lock().unwrap();
        invoices.push(payload.clone());

        Ok(serde_json::json!({
            "id": format!("INV-{}", invoices.len()),
            "status": "accepted",
        }))
    }
}

/// Wire a lote processor from the gateway fakes
pub fn build_processor(
    pool: &sqlx::PgPool,
    pos: std::sync::Arc<MockPosGateway>,
    accounting: std::sync::Arc<MockAccountingGateway>,
) -> recon_core::orchestration::LoteProcessor {
    use recon_core::orchestration::{
        InvoiceSynchronizer, LoteProcessor, TransactionRegistrar, ValidationPipeline,
    };
    use std::sync::Arc;

    let pos_dyn: Arc<dyn PosGateway> = pos;
    let accounting_dyn: Arc<dyn AccountingGateway> = accounting;

    LoteProcessor::new(
        pool.clone(),
        Arc::clone(&pos_dyn),
        TransactionRegistrar::new(pool.clone()),
        ValidationPipeline::new(pool.clone(), pos_dyn, Arc::clone(&accounting_dyn)),
        InvoiceSynchronizer::new(pool.clone(), accounting_dyn),
    )
}

/// A well-formed document with configurable identity fields
pub fn sample_document(
    kind: DocumentKind,
    document_number: &str,
    identification: &str,
    item_code: &str,
) -> PosDocument {
    let (discriminator, prefix) = match kind {
        DocumentKind::Purchases => ("Factura de compra", "FC"),
        DocumentKind::Sales => ("Factura de venta", "FV"),
    };

    PosDocument {
        document_kind: discriminator.to_string(),
        document_number: document_number.to_string(),
        date: "2025-05-02".parse().unwrap(),
        store_name: "Sede Centro".to_string(),
        prefix: prefix.to_string(),
        series: "A".to_string(),
        counterparty: PosCounterparty {
            kind: "third_party".to_string(),
            identification: identification.to_string(),
            name: "Comercial Andina SAS".to_string(),
        },
        items: vec![PosLineItem {
            code: item_code.to_string(),
            description: "Cafe 500g".to_string(),
            quantity: 2.0,
            unit_price: 18000.0,
            total: 36000.0,
        }],
        payments: vec![PosPaymentLine {
            method_name: "Efectivo".to_string(),
            value: 36000.0,
        }],
        total: 36000.0,
    }
}

/// A document whose discriminator the mapping table does not recognize
pub fn unknown_kind_document(document_number: &str) -> PosDocument {
    let mut document = sample_document(
        DocumentKind::Sales,
        document_number,
        "900123456-1",
        "SKU-001",
    );
    document.document_kind = "Nota de ajuste".to_string();
    document
}
