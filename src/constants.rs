//! # System Constants
//!
//! Core constants, status groupings and event names that define the
//! operational boundaries of the reconciliation core.

// Re-export state types for convenience
pub use crate::state_machine::{JobState, LoteState, StageStatus, TransactionState};

/// Lifecycle events emitted for logging around dispatch and synchronization
pub mod events {
    // Job lifecycle events
    pub const JOB_CLAIMED: &str = "job.claimed";
    pub const JOB_COMPLETED: &str = "job.completed";
    pub const JOB_FAILED: &str = "job.failed";

    // Lote lifecycle events
    pub const LOTE_CREATED: &str = "lote.created";
    pub const LOTE_FINALIZED: &str = "lote.finalized";

    // Transaction lifecycle events
    pub const TRANSACTION_REGISTERED: &str = "transaction.registered";
    pub const TRANSACTION_VALIDATED: &str = "transaction.validated";
    pub const TRANSACTION_FAILED: &str = "transaction.failed";

    // Invoice synchronization events
    pub const INVOICE_SUBMITTED: &str = "invoice.submitted";
    pub const INVOICE_REJECTED: &str = "invoice.rejected";

    // Ingestion queue events (consumed for logging only)
    pub const INGESTION_ENQUEUED: &str = "ingestion.enqueued";
    pub const INGESTION_RETRIED: &str = "ingestion.retried";
    pub const INGESTION_EXHAUSTED: &str = "ingestion.exhausted";
}

/// System-wide constants
pub mod system {
    /// The only ingestion source this core dispatches for
    pub const SOURCE_POS: &str = "pos";

    /// Version compatibility marker
    pub const RECON_CORE_VERSION: &str = "0.1.0";

    /// Worker loop polling interval
    pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 15;

    /// Ingestion queue name used by the queue-driven dispatch path
    pub const DEFAULT_INGESTION_QUEUE: &str = "recon_ingestion";

    /// Queue-level retry policy: attempts before a message is archived
    pub const QUEUE_MAX_ATTEMPTS: i32 = 3;

    /// Queue-level retry policy: exponential backoff base delay
    pub const QUEUE_BASE_DELAY_SECONDS: u64 = 5;
}

/// Status groupings for validation and dispatch logic
pub mod status_groups {
    use super::{JobState, LoteState, TransactionState};

    /// Job statuses that indicate the job will never be claimed again
    pub const JOB_TERMINAL_STATES: &[JobState] = &[JobState::Done, JobState::Error];

    /// Lote statuses reached only after the ingestion sequence finished
    pub const LOTE_FINAL_STATES: &[LoteState] = &[
        LoteState::Success,
        LoteState::Failed,
        LoteState::ProcessedWithErrors,
    ];

    /// Transaction statuses eligible for further pipeline work
    pub const TRANSACTION_ACTIVE_STATES: &[TransactionState] = &[
        TransactionState::Validation,
        TransactionState::ToInvoice,
    ];

    /// Transaction statuses that end the pipeline for a document
    pub const TRANSACTION_TERMINAL_STATES: &[TransactionState] =
        &[TransactionState::Success, TransactionState::Failed];
}
