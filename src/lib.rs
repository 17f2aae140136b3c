#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Recon Core Rust
//!
//! Rust core for reconciling point-of-sale transactions with an external
//! accounting platform.
//!
//! ## Overview
//!
//! The core pulls batches ("lotes") of purchase/sale documents from a POS
//! export gateway, maps each document into accounting shape, validates
//! five independent reference dimensions (document type, cost center,
//! counter-party contact, line items, payment methods) against the
//! accounting system's master data (creating missing reference records on
//! the fly), and submits fully-validated documents as invoices.
//!
//! ## Architecture
//!
//! Dispatch is a durable job table shared by any number of worker
//! processes. Claims use `FOR UPDATE SKIP LOCKED`, so each pending job is
//! claimed by exactly one worker; the claim commit is a short critical
//! section and the ingestion work runs outside the lock. A second,
//! queue-driven dispatch path shares the same claim step as its single
//! scheduling authority.
//!
//! Within one job the sequence is strictly sequential: fetch → register →
//! validate → synchronize. Failure isolation is per document: each
//! transaction carries an auditable per-dimension trail of why it did or
//! did not become an invoice, and one transaction's failure never aborts
//! its batch.
//!
//! ## Module Organization
//!
//! - [`models`] - sqlx-backed data layer (jobs, lotes, transactions)
//! - [`clients`] - POS and accounting gateway HTTP clients
//! - [`orchestration`] - claimer, dispatch loops, registrar, validation
//!   pipeline, invoice synchronizer
//! - [`messaging`] - pgmq-backed ingestion queue boundary
//! - [`state_machine`] - job/lote/transaction states and transition rules
//! - [`config`] - configuration management
//! - [`error`] - structured error handling
//!
//! ## Testing
//!
//! Database-backed tests use the sqlx native test harness with automatic
//! per-test isolation:
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests (requires DATABASE_URL)
//! ```

pub mod clients;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod test_helpers;

pub use config::{ConfigManager, ReconConfig};
pub use constants::{events, status_groups, system};
pub use error::{ReconError, Result};
pub use state_machine::{JobState, LoteState, StageStatus, TransactionState};
