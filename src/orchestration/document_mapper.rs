//! # Document Mapper
//!
//! Kind-specific projection of a raw POS document into accounting shape.
//! The mapper is a pure projection: incomplete values (empty codes,
//! missing identifications) are carried through and surface as validation
//! failures in the pipeline, where they leave an auditable trail.

use crate::models::document::{
    DocumentKind, MappedDocument, MappedItem, MappedPayment, PosDocument,
};

/// Counter-party role the accounting system expects for each kind
pub fn contact_kind_for(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Purchases => "supplier",
        DocumentKind::Sales => "customer",
    }
}

/// Project one POS document into the accounting-shaped core data
pub fn map_document(kind: DocumentKind, document: &PosDocument) -> MappedDocument {
    let items = document
        .items
        .iter()
        .map(|item| MappedItem {
            code: item.code.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total,
        })
        .collect();

    let payments = document
        .payments
        .iter()
        .map(|payment| MappedPayment {
            method_name: payment.method_name.clone(),
            value: payment.value,
        })
        .collect();

    MappedDocument {
        kind,
        document_number: document.document_number.clone(),
        date: document.date,
        prefix: document.prefix.clone(),
        series: document.series.clone(),
        cost_center_name: document.store_name.clone(),
        contact_kind: contact_kind_for(kind).to_string(),
        contact_identification: document.counterparty.identification.clone(),
        contact_name: document.counterparty.name.clone(),
        items,
        payments,
        total: document.total,
    }
}
