//! The all-or-nothing registration gate: one failed document in a batch
//! suppresses validation and synchronization for the entire lote, even
//! though the other documents were already persisted.

mod common;

use std::sync::Arc;

use sqlx::PgPool;

use common::{
    build_processor, sample_document, unknown_kind_document, MockAccountingGateway,
    MockPosGateway,
};
use recon_core::models::document::DocumentKind;
use recon_core::models::{Lote, Transaction};
use recon_core::orchestration::{RegistrationOutcome, TransactionRegistrar};
use recon_core::test_helpers::{create_test_job, create_test_lote};

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn registration_failure_suppresses_validation_for_the_lote(pool: PgPool) {
    let job = create_test_job(&pool, DocumentKind::Sales).await;

    let pos = Arc::new(MockPosGateway::with_documents(vec![
        sample_document(DocumentKind::Sales, "FV-1", "900123456-1", "SKU-001"),
        unknown_kind_document("FV-2"),
    ]));
    let accounting = Arc::new(MockAccountingGateway::with_full_master_data());
    let processor = build_processor(&pool, pos, Arc::clone(&accounting));

    let summary = processor.process_job(&job).await.unwrap();

    assert!(summary.gate_tripped);
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.registered, 1);
    assert_eq!(summary.registration_failures, 1);

    let lote = Lote::find_by_id(&pool, summary.lote_id).await.unwrap().unwrap();
    assert_eq!(lote.status, "failed");
    assert_eq!(lote.transactions_count, 1);
    let error = lote.error.expect("gate failure must carry structured detail");
    assert_eq!(error["failures"][0]["document_number"], "FV-2");

    // The surviving sibling was persisted but never validated: still in
    // `validation` and with no stage details recorded.
    let transactions = Transaction::find_by_lote(&pool, summary.lote_id).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, "validation");
    assert!(transactions[0].document_check.is_none());
    assert!(transactions[0].invoice_payload.is_none());

    // And nothing was submitted
    assert_eq!(accounting.submitted_invoice_count(), 0);
}

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn registrar_isolates_per_document_failures(pool: PgPool) {
    let lote = create_test_lote(&pool, None, DocumentKind::Sales).await;
    let registrar = TransactionRegistrar::new(pool.clone());

    let batch = registrar
        .register_batch(
            lote.lote_id,
            DocumentKind::Sales,
            &[
                sample_document(DocumentKind::Sales, "FV-1", "900123456-1", "SKU-001"),
                unknown_kind_document("FV-2"),
                sample_document(DocumentKind::Sales, "FV-3", "900123456-1", "SKU-001"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(batch.outcomes.len(), 3);
    assert_eq!(batch.registered_count(), 2);
    assert!(batch.has_failures());

    match &batch.outcomes[1] {
        RegistrationOutcome::Failed {
            document_number,
            error,
        } => {
            assert_eq!(document_number, "FV-2");
            assert!(error.contains("Nota de ajuste"));
        }
        other => panic!("expected failed outcome, got {other:?}"),
    }

    let persisted = Transaction::find_by_lote(&pool, lote.lote_id).await.unwrap();
    assert_eq!(persisted.len(), 2);
}

#[sqlx::test(migrator = "recon_core::test_helpers::MIGRATOR")]
async fn documents_of_the_other_kind_are_skipped(pool: PgPool) {
    let lote = create_test_lote(&pool, None, DocumentKind::Sales).await;
    let registrar = TransactionRegistrar::new(pool.clone());

    let batch = registrar
        .register_batch(
            lote.lote_id,
            DocumentKind::Sales,
            &[sample_document(
                DocumentKind::Purchases,
                "FC-1",
                "900123456-1",
                "SKU-001",
            )],
        )
        .await
        .unwrap();

    assert!(batch.outcomes.is_empty());
    assert!(!batch.has_failures());

    let persisted = Transaction::find_by_lote(&pool, lote.lote_id).await.unwrap();
    assert!(persisted.is_empty());
}
