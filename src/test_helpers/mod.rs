//! # Test Helpers
//!
//! Migrator and row factories shared by the database-backed integration
//! tests. Use with the sqlx native test harness:
//!
//! ```rust,ignore
//! #[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
//! async fn my_test(pool: sqlx::PgPool) { /* ... */ }
//! ```

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::models::document::{
    DocumentKind, PosCounterparty, PosDocument, PosLineItem, PosPaymentLine,
};
use crate::models::{Job, JobTrigger, Lote, NewJob, NewLote, NewTransaction, Transaction};
use crate::orchestration::document_mapper::map_document;

/// Migrator over this crate's migrations directory
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Create a pending job covering the last 24 hours
pub async fn create_test_job(pool: &PgPool, kind: DocumentKind) -> Job {
    let end = Utc::now();
    Job::create(
        pool,
        NewJob {
            document_kind: kind,
            job_type: JobTrigger::Auto,
            start_time: end - Duration::hours(24),
            end_time: end,
            triggered_by: Some("test-suite".to_string()),
        },
    )
    .await
    .expect("failed to create test job")
}

/// Create a processing lote, optionally tied to a job
pub async fn create_test_lote(pool: &PgPool, job_id: Option<i64>, kind: DocumentKind) -> Lote {
    Lote::create(
        pool,
        NewLote {
            job_id,
            kind,
            filter: serde_json::json!({"window": "test"}),
        },
    )
    .await
    .expect("failed to create test lote")
}

/// Create a transaction in `validation` from a sample document
pub async fn create_test_transaction(
    pool: &PgPool,
    lote_id: i64,
    kind: DocumentKind,
    document_number: &str,
) -> Transaction {
    let document = sample_pos_document(kind, document_number);
    let mapped = map_document(kind, &document);

    Transaction::create(
        pool,
        NewTransaction {
            lote_id,
            kind,
            document_number: document_number.to_string(),
            raw_source_data: serde_json::to_value(&document).unwrap(),
            mapped_core_data: mapped,
        },
    )
    .await
    .expect("failed to create test transaction")
}

/// A well-formed POS document of the given kind
pub fn sample_pos_document(kind: DocumentKind, document_number: &str) -> PosDocument {
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
            identification: "900123456-1".to_string(),
            name: "Comercial Andina SAS".to_string(),
        },
        items: vec![PosLineItem {
            code: "SKU-001".to_string(),
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
