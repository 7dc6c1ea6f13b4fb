//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a management node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for the mirror database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Seconds between metadata refreshes of a subscribed chain.
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,

    /// Seconds to wait for a governance submission.
    #[serde(default = "default_tx_timeout_secs")]
    pub tx_timeout_secs: u64,

    /// Ingestion workers per chain. Blocks are only applied in height
    /// order with a single worker.
    #[serde(default = "default_ingest_workers")]
    pub ingest_workers: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./chainops_data")
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_refresh_secs() -> u64 {
    60
}

fn default_tx_timeout_secs() -> u64 {
    10
}

fn default_ingest_workers() -> usize {
    1
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.refresh_interval_secs == 0 {
            return Err(NodeError::Config("refresh_interval_secs must be positive".into()));
        }
        if self.tx_timeout_secs == 0 {
            return Err(NodeError::Config("tx_timeout_secs must be positive".into()));
        }
        if self.ingest_workers == 0 {
            return Err(NodeError::Config("ingest_workers must be positive".into()));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_secs(self.tx_timeout_secs)
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            refresh_interval_secs: default_refresh_secs(),
            tx_timeout_secs: default_tx_timeout_secs(),
            ingest_workers: default_ingest_workers(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}
