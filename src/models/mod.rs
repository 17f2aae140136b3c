pub mod document;
pub mod job;
pub mod lote;
pub mod transaction;

// Re-export core models for easy access
pub use document::{
    DocumentKind, MappedDocument, MappedItem, MappedPayment, PosContactDetail,
    PosCounterparty, PosDocument, PosLineItem, PosPaymentLine,
};
pub use job::{Job, JobTrigger, NewJob};
pub use lote::{Lote, NewLote};
pub use transaction::{NewTransaction, Transaction};
