//! # Reconciliation State Management
//!
//! State definitions and transition rules for jobs, lotes and
//! transactions. Status values are persisted as strings; the enums here
//! are the single source of truth for parsing and for which transitions
//! are legal.

pub mod states;

pub use states::{JobState, LoteState, StageStatus, TransactionState};
