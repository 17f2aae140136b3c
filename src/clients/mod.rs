//! # Gateway Clients
//!
//! HTTP boundaries to the two external systems: the POS export gateway
//! and the accounting platform. Both are consumed through traits so the
//! orchestration layer and tests can substitute implementations.

pub mod accounting;
pub mod pos;
pub mod token;

pub use accounting::{
    AccountingApiClient, AccountingGateway, ContactPayload, ContactRecord, CostCenterRecord,
    DocumentTypeRecord, ItemPayload, ItemRecord, PaymentMethodRecord,
};
pub use pos::{DateWindow, PosApiClient, PosGateway, PosSession};
pub use token::{CachedToken, TokenCache};
