//! # Reconciliation Orchestration
//!
//! Dispatch and pipeline components: the row-locking job claimer, the two
//! dispatch paths (polling loop and ingestion queue worker), and the
//! ingestion sequence itself (registrar → validation pipeline → invoice
//! synchronizer) coordinated per job by the lote processor.

pub mod document_mapper;
pub mod invoice_synchronizer;
pub mod job_claimer;
pub mod lote_processor;
pub mod queue_worker;
pub mod registrar;
pub mod types;
pub mod validation_pipeline;
pub mod worker_loop;

pub use invoice_synchronizer::InvoiceSynchronizer;
pub use job_claimer::JobClaimer;
pub use lote_processor::LoteProcessor;
pub use queue_worker::IngestionQueueWorker;
pub use registrar::TransactionRegistrar;
pub use types::{
    BatchRegistration, ProcessingSummary, RegistrationOutcome, StageCheck, ValidationStage,
};
pub use validation_pipeline::ValidationPipeline;
pub use worker_loop::WorkerLoop;
