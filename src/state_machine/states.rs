use serde::{Deserialize, Serialize};
use std::fmt;

/// Job state definitions for the durable job table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting to be claimed by a worker
    Pending,
    /// Claimed; the ingestion sequence is running
    Processing,
    /// Ingestion sequence completed
    Done,
    /// Ingestion sequence raised an error (recorded on the job)
    Error,
}

impl JobState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}

/// Lote state definitions covering one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoteState {
    /// Ingestion/registration/validation/sync in flight
    Processing,
    /// Every transaction in the lote reached `success`
    Success,
    /// Batch-level failure: export fetch failed or the registration gate tripped
    Failed,
    /// Sequence completed but at least one transaction failed
    ProcessedWithErrors,
}

impl LoteState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl fmt::Display for LoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::ProcessedWithErrors => write!(f, "processed_with_errors"),
        }
    }
}

impl std::str::FromStr for LoteState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "processed_with_errors" => Ok(Self::ProcessedWithErrors),
            _ => Err(format!("Invalid lote state: {s}")),
        }
    }
}

/// Transaction state definitions for the per-document pipeline
///
/// The lifecycle is `validation` → {`to_invoice`, `failed`} →
/// {`success`, `failed`}. No transition ever returns a transaction to
/// `validation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    /// Initial state; the five-dimension validation has not completed
    Validation,
    /// Declared in the source schema but assigned by no code path.
    /// Preserved for row compatibility; `can_transition_to` accepts it
    /// nowhere, so it is unreachable by construction.
    Validated,
    /// All five dimensions validated; awaiting invoice submission
    ToInvoice,
    /// Validation or submission failed
    Failed,
    /// Invoice accepted by the accounting gateway
    Success,
}

impl TransactionState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Whether a transition from this state to `target` is legal
    pub fn can_transition_to(&self, target: TransactionState) -> bool {
        matches!(
            (self, target),
            (Self::Validation, Self::ToInvoice)
                | (Self::Validation, Self::Failed)
                | (Self::ToInvoice, Self::Success)
                | (Self::ToInvoice, Self::Failed)
        )
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Validated => write!(f, "validated"),
            Self::ToInvoice => write!(f, "to_invoice"),
            Self::Failed => write!(f, "failed"),
            Self::Success => write!(f, "success"),
        }
    }
}

impl std::str::FromStr for TransactionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation" => Ok(Self::Validation),
            "validated" => Ok(Self::Validated),
            "to_invoice" => Ok(Self::ToInvoice),
            "failed" => Ok(Self::Failed),
            "success" => Ok(Self::Success),
            _ => Err(format!("Invalid transaction state: {s}")),
        }
    }
}

/// Per-dimension validation outcome recorded in the check columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed,
}

impl StageStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Default state for new jobs
impl Default for JobState {
    fn default() -> Self {
        Self::Pending
    }
}

/// Default state for new lotes
impl Default for LoteState {
    fn default() -> Self {
        Self::Processing
    }
}

/// Default state for new transactions
impl Default for TransactionState {
    fn default() -> Self {
        Self::Validation
    }
}
