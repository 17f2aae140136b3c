//! # Reconciliation Configuration
//!
//! Environment-aware configuration for the worker process and both
//! gateway clients. Values come from a YAML file with per-environment
//! overrides; `DATABASE_URL` wins over the structured database section so
//! deployments and tests can inject a ready-made connection string.

pub mod loader;

use serde::{Deserialize, Serialize};

pub use loader::ConfigManager;

use crate::constants::system;

/// Root configuration structure mirroring recon-config.yaml
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ReconConfig {
    /// Database connection and pooling configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// POS export gateway credentials and endpoint
    #[serde(default)]
    pub pos: PosGatewayConfig,

    /// Accounting platform credentials and endpoint
    #[serde(default)]
    pub accounting: AccountingGatewayConfig,

    /// Polling worker behavior
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Ingestion queue behavior (second dispatch path)
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Database connection and pooling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Full connection string; overrides the structured fields when set
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub pool: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            username: "recon".to_string(),
            password: "recon".to_string(),
            database: "recon_development".to_string(),
            pool: 10,
        }
    }
}

impl DatabaseConfig {
    /// Effective connection string for sqlx
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// POS export gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PosGatewayConfig {
    /// Authentication endpoint base; the export base address comes from
    /// the authenticate response
    pub base_url: String,
    pub username: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl Default for PosGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            username: String::new(),
            api_key: String::new(),
            timeout_ms: 30_000,
        }
    }
}

/// Accounting platform gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountingGatewayConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_ms: u64,
    /// Refresh the cached access token this many seconds before expiry
    pub token_refresh_margin_seconds: i64,
}

impl Default for AccountingGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8082".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_ms: 30_000,
            token_refresh_margin_seconds: 60,
        }
    }
}

/// Polling worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    pub poll_interval_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: system::DEFAULT_POLL_INTERVAL_SECONDS,
        }
    }
}

/// Ingestion queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    pub ingestion_queue: String,
    pub max_attempts: i32,
    pub base_delay_seconds: u64,
    pub visibility_timeout_seconds: i32,
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ingestion_queue: system::DEFAULT_INGESTION_QUEUE.to_string(),
            max_attempts: system::QUEUE_MAX_ATTEMPTS,
            base_delay_seconds: system::QUEUE_BASE_DELAY_SECONDS,
            visibility_timeout_seconds: 300,
            poll_interval_ms: 1000,
        }
    }
}

impl ReconConfig {
    /// Validate values that would otherwise fail deep inside the worker
    pub fn validate(&self) -> Result<(), String> {
        if self.database.pool == 0 {
            return Err("database.pool must be at least 1".to_string());
        }
        if self.worker.poll_interval_seconds == 0 {
            return Err("worker.poll_interval_seconds must be at least 1".to_string());
        }
        if self.queue.max_attempts < 1 {
            return Err("queue.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconConfig::default();
        assert_eq!(config.worker.poll_interval_seconds, 15);
        assert_eq!(config.queue.max_attempts, 3);
        assert_eq!(config.queue.base_delay_seconds, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_connection_url_prefers_explicit_url() {
        let mut db = DatabaseConfig::default();
        assert!(db.connection_url().contains("recon_development"));

        db.url = Some("postgresql://a:b@c:5432/d".to_string());
        assert_eq!(db.connection_url(), "postgresql://a:b@c:5432/d");
    }

    #[test]
    fn test_validation_rejects_zero_pool() {
        let mut config = ReconConfig::default();
        config.database.pool = 0;
        assert!(config.validate().is_err());
    }
}
