//! Configuration Loader
//!
//! Environment-aware configuration loading. Discovers a YAML file for the
//! current environment, falls back to defaults when none exists, and lets
//! `DATABASE_URL` override the structured database section.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::ReconConfig;
use crate::error::{ReconError, Result};

/// Loaded configuration plus the environment it was resolved for
pub struct ConfigManager {
    config: ReconConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> Result<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_for_environment(&environment)
    }

    /// Load configuration for an explicit environment
    ///
    /// Resolution order: `config/recon-{env}.yaml`, then
    /// `config/recon.yaml`, then built-in defaults. `DATABASE_URL` always
    /// wins over the file's database section.
    pub fn load_for_environment(environment: &str) -> Result<Arc<ConfigManager>> {
        let candidates = [
            PathBuf::from(format!("config/recon-{environment}.yaml")),
            PathBuf::from("config/recon.yaml"),
        ];

        let mut config = ReconConfig::default();
        let mut loaded_from = None;
        for path in &candidates {
            if path.exists() {
                config = Self::read_yaml(path)?;
                loaded_from = Some(path.clone());
                break;
            }
        }

        match &loaded_from {
            Some(path) => debug!(
                environment = environment,
                path = %path.display(),
                "Loaded reconciliation configuration"
            ),
            None => warn!(
                environment = environment,
                "No configuration file found; using built-in defaults"
            ),
        }

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database.url = Some(url);
        }

        config
            .validate()
            .map_err(|msg| ReconError::configuration("recon-config", msg))?;

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
        }))
    }

    fn read_yaml(path: &Path) -> Result<ReconConfig> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReconError::configuration(path.display().to_string(), e.to_string())
        })?;
        serde_yaml::from_str(&raw)
            .map_err(|e| ReconError::configuration(path.display().to_string(), e.to_string()))
    }

    /// Detect the current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("RECON_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Get the environment this configuration was resolved for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Configuration as JSON with credentials masked, for startup logging
    pub fn debug_config(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(&self.config).unwrap_or_default();
        for path in [
            ["database", "password"],
            ["pos", "api_key"],
            ["accounting", "client_secret"],
        ] {
            if let Some(field) = value
                .get_mut(path[0])
                .and_then(|section| section.get_mut(path[1]))
            {
                *field = serde_json::Value::String("***".to_string());
            }
        }
        if let Some(url) = value.get_mut("database").and_then(|d| d.get_mut("url")) {
            if !url.is_null() {
                *url = serde_json::Value::String("***".to_string());
            }
        }
        value
    }
}
