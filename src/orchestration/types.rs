//! Shared types for the dispatch and validation components.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state_machine::StageStatus;

/// The five independent validation dimensions, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    Document,
    CostCenter,
    Contact,
    Items,
    Payments,
}

impl ValidationStage {
    /// Pipeline order; the contact stage is the only one that can abort
    /// the stages after it.
    pub const ALL: [ValidationStage; 5] = [
        ValidationStage::Document,
        ValidationStage::CostCenter,
        ValidationStage::Contact,
        ValidationStage::Items,
        ValidationStage::Payments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::CostCenter => "cost_center",
            Self::Contact => "contact",
            Self::Items => "items",
            Self::Payments => "payments",
        }
    }
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage's persisted outcome: a status plus the audit details that
/// explain it (matched ids, created records, per-line failures).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCheck {
    pub status: StageStatus,
    pub details: serde_json::Value,
}

impl StageCheck {
    pub fn success(details: serde_json::Value) -> Self {
        Self {
            status: StageStatus::Success,
            details,
        }
    }

    pub fn failed(details: serde_json::Value) -> Self {
        Self {
            status: StageStatus::Failed,
            details,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Per-document registration result. An explicit variant per outcome:
/// a failed document never becomes a hole in the batch list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistrationOutcome {
    Registered {
        transaction_id: i64,
        document_number: String,
    },
    Failed {
        document_number: String,
        error: String,
    },
}

/// Typed aggregate of one lote's registration pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRegistration {
    pub outcomes: Vec<RegistrationOutcome>,
}

impl BatchRegistration {
    pub fn push(&mut self, outcome: RegistrationOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn registered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RegistrationOutcome::Registered { .. }))
            .count()
    }

    pub fn failures(&self) -> Vec<&RegistrationOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RegistrationOutcome::Failed { .. }))
            .collect()
    }

    /// Whether the all-or-nothing gate suppresses validation/sync
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, RegistrationOutcome::Failed { .. }))
    }
}

/// Outcome of one job's full ingestion sequence, for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub lote_id: i64,
    pub fetched: usize,
    pub registered: usize,
    pub registration_failures: usize,
    /// True when registration failures suppressed validation/sync
    pub gate_tripped: bool,
    pub succeeded: i64,
    pub failed: i64,
}
