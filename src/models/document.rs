//! # POS Document Types
//!
//! Wire shapes for documents coming out of the POS export gateway, the
//! closed document-kind discriminator, and the accounting-shaped
//! projection persisted as a transaction's `mapped_core_data`.
//!
//! The gateway distinguishes purchase and sale documents with a free-text
//! discriminator field. That is modeled here as a closed enum with an
//! explicit mapping table; unrecognized discriminators are rejected with
//! a typed error instead of passing through.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ReconError, Result};

/// Closed document-kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Purchases,
    Sales,
}

/// Mapping table from the gateway's free-text discriminators.
/// Matching is case-insensitive on the trimmed value.
const DISCRIMINATOR_TABLE: &[(&str, DocumentKind)] = &[
    ("factura de compra", DocumentKind::Purchases),
    ("compra", DocumentKind::Purchases),
    ("factura de venta", DocumentKind::Sales),
    ("venta", DocumentKind::Sales),
];

impl DocumentKind {
    /// Resolve a free-text discriminator into a document kind
    pub fn from_discriminator(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();
        DISCRIMINATOR_TABLE
            .iter()
            .find(|(text, _)| *text == normalized)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ReconError::UnknownDocumentKind {
                discriminator: raw.to_string(),
            })
    }

    /// Document-kind id used by the POS export endpoint
    pub fn export_kind_id(&self) -> i32 {
        match self {
            Self::Purchases => 1,
            Self::Sales => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchases => "purchases",
            Self::Sales => "sales",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "purchases" => Ok(Self::Purchases),
            "sales" => Ok(Self::Sales),
            _ => Err(format!("Invalid document kind: {s}")),
        }
    }
}

/// One document as decoded from the POS export payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosDocument {
    /// Free-text discriminator ("Factura de venta", "Compra", ...)
    pub document_kind: String,
    pub document_number: String,
    pub date: NaiveDate,
    /// POS store/location name; resolves to an accounting cost center
    pub store_name: String,
    /// Document-type prefix and series used for accounting matching
    pub prefix: String,
    pub series: String,
    pub counterparty: PosCounterparty,
    pub items: Vec<PosLineItem>,
    pub payments: Vec<PosPaymentLine>,
    pub total: f64,
}

impl PosDocument {
    /// Resolve this document's discriminator into a closed kind
    pub fn kind(&self) -> Result<DocumentKind> {
        DocumentKind::from_discriminator(&self.document_kind)
    }
}

/// Counter-party reference embedded in a POS document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosCounterparty {
    /// Counter-party kind as the POS system reports it (supplier/customer)
    pub kind: String,
    pub identification: String,
    pub name: String,
}

/// One line item embedded in a POS document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosLineItem {
    pub code: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
}

/// One payment line embedded in a POS document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosPaymentLine {
    pub method_name: String,
    pub value: f64,
}

/// Full contact record fetched from the POS gateway during the
/// contact-creation fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosContactDetail {
    pub kind: String,
    pub identification: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Accounting-shaped projection of one POS document.
///
/// Persisted verbatim as the transaction's `mapped_core_data` column and
/// consumed by the validation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedDocument {
    pub kind: DocumentKind,
    pub document_number: String,
    pub date: NaiveDate,
    pub prefix: String,
    pub series: String,
    pub cost_center_name: String,
    pub contact_kind: String,
    pub contact_identification: String,
    pub contact_name: String,
    pub items: Vec<MappedItem>,
    pub payments: Vec<MappedPayment>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedItem {
    pub code: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedPayment {
    pub method_name: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminator_mapping() {
        assert_eq!(
            DocumentKind::from_discriminator("Factura de venta").unwrap(),
            DocumentKind::Sales
        );
        assert_eq!(
            DocumentKind::from_discriminator("  COMPRA ").unwrap(),
            DocumentKind::Purchases
        );
    }

    #[test]
    fn test_unknown_discriminator_is_rejected() {
        let err = DocumentKind::from_discriminator("Nota de ajuste").unwrap_err();
        assert!(matches!(err, ReconError::UnknownDocumentKind { .. }));
        assert!(format!("{err}").contains("Nota de ajuste"));
    }

    #[test]
    fn test_pos_document_decoding() {
        let raw = serde_json::json!({
            "documentKind": "Factura de venta",
            "documentNumber": "FV-1042",
            "date": "2025-05-02",
            "storeName": "Sede Norte",
            "prefix": "FV",
            "series": "A",
            "counterparty": {
                "kind": "customer",
                "identification": "900123456-1",
                "name": "Comercial Andina SAS"
            },
            "items": [
                {"code": "SKU-001", "description": "Cafe 500g", "quantity": 2.0,
                 "unitPrice": 18000.0, "total": 36000.0}
            ],
            "payments": [
                {"methodName": "Efectivo", "value": 36000.0}
            ],
            "total": 36000.0
        });

        let doc: PosDocument = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.kind().unwrap(), DocumentKind::Sales);
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.payments[0].method_name, "Efectivo");
    }
}
