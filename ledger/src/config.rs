use crate::error::LedgerError;
use authwallet_types::ThresholdParams;
use authwallet_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ledger configuration, loadable from TOML.
///
/// Every field has a default, so an empty file is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Votes needed to authenticate or reject an operation.
    #[serde(default)]
    pub thresholds: ThresholdParams,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to maintain Prometheus metrics.
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl LedgerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, LedgerError> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        self.thresholds
            .validate()
            .map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::from_config_str(&self.log_format)
    }

    /// Install the global tracing subscriber described by this config.
    pub fn init_logging(&self) -> Result<(), LedgerError> {
        authwallet_utils::init_logging(self.log_format(), &self.log_level)
            .map_err(|e| LedgerError::Config(e.to_string()))
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdParams::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: default_true(),
        }
    }
}
