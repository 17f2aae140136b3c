//! # Reconciliation Error Types
//!
//! Structured error handling for the reconciliation core using thiserror.
//! Per-transaction failures (`StageValidation`, `ContactCreation`) are
//! recorded as transaction state by the pipeline; gateway and persistence
//! errors propagate to the job boundary where they are caught, logged and
//! recorded on the owning job.

use thiserror::Error;

use crate::orchestration::types::ValidationStage;

/// Comprehensive error type for the reconciliation core
#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Validation failed at {stage} stage: {message}")]
    StageValidation {
        stage: ValidationStage,
        message: String,
    },

    #[error("Contact creation failed for identification {identification}: {message}")]
    ContactCreation {
        identification: String,
        message: String,
    },

    #[error("{gateway} gateway error (HTTP {status}): {body}")]
    Gateway {
        gateway: &'static str,
        status: u16,
        body: String,
    },

    #[error("{gateway} authentication failed: {message}")]
    Auth {
        gateway: &'static str,
        message: String,
    },

    #[error("Unrecognized document discriminator: {discriminator}")]
    UnknownDocumentKind { discriminator: String },

    #[error("Network error against {gateway} gateway: {message}")]
    Network {
        gateway: &'static str,
        message: String,
    },

    #[error("Database error: {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    Messaging {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },
}

impl ReconError {
    /// Create a stage validation failure (non-fatal, recorded on the transaction)
    pub fn stage_validation(stage: ValidationStage, message: impl Into<String>) -> Self {
        Self::StageValidation {
            stage,
            message: message.into(),
        }
    }

    /// Create a contact creation failure (aborts the remaining stages of one transaction)
    pub fn contact_creation(
        identification: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ContactCreation {
            identification: identification.into(),
            message: message.into(),
        }
    }

    /// Create a gateway error carrying the upstream status and body
    pub fn gateway(gateway: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::Gateway {
            gateway,
            status,
            body: body.into(),
        }
    }

    /// Create an authentication error for a gateway
    pub fn auth(gateway: &'static str, message: impl Into<String>) -> Self {
        Self::Auth {
            gateway,
            message: message.into(),
        }
    }

    /// Create a network-level error for a gateway
    pub fn network(gateway: &'static str, message: impl Into<String>) -> Self {
        Self::Network {
            gateway,
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a messaging error
    pub fn messaging(
        queue_name: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Messaging {
            queue_name: queue_name.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the remaining stages of one transaction
    /// while leaving its siblings untouched.
    pub fn aborts_transaction(&self) -> bool {
        matches!(self, Self::ContactCreation { .. })
    }
}

impl From<sqlx::Error> for ReconError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ReconError::database("query", "No rows found"),
            sqlx::Error::Database(db_err) => {
                ReconError::database("database", db_err.to_string())
            }
            sqlx::Error::PoolTimedOut => {
                ReconError::database("database_pool", "Connection pool timed out")
            }
            sqlx::Error::PoolClosed => {
                ReconError::database("database_pool", "Connection pool is closed")
            }
            sqlx::Error::Configuration(config_err) => {
                ReconError::configuration("database", config_err.to_string())
            }
            _ => ReconError::database("connection", err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(err: serde_json::Error) -> Self {
        ReconError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ReconError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ReconError::database("migrate", err.to_string())
    }
}

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let stage_err = ReconError::stage_validation(ValidationStage::CostCenter, "no match");
        assert!(matches!(stage_err, ReconError::StageValidation { .. }));
        assert!(!stage_err.aborts_transaction());

        let contact_err = ReconError::contact_creation("900123456-1", "upstream rejected");
        assert!(contact_err.aborts_transaction());

        let gateway_err = ReconError::gateway("accounting", 422, "duplicate code");
        assert!(matches!(gateway_err, ReconError::Gateway { status: 422, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = ReconError::gateway("accounting", 500, "upstream exploded");
        let display = format!("{err}");
        assert!(display.contains("accounting"));
        assert!(display.contains("500"));
        assert!(display.contains("upstream exploded"));

        let auth = ReconError::auth("pos", "response did not include a base address");
        assert!(format!("{auth}").contains("pos authentication failed"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: ReconError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ReconError::Database { .. }));
    }

    #[test]
    fn test_serde_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: ReconError = json_err.into();
        assert!(matches!(err, ReconError::Serialization { .. }));
    }
}
