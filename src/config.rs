//! Configuration file
//!
//! ```json
//! {
//!   "uri": "mongodb://localhost:27017/news",
//!   "fetch_batch": 1000,
//!   "log_level": "warn",
//!   "seed_dir": "./fixtures"
//! }
//! ```
//!
//! Only `uri` is required. Every validation failure is a
//! `DAILY_CONFIGURATION` error raised before any query runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{QueryError, QueryResult};
use crate::executor::DEFAULT_FETCH_BATCH;
use crate::observability::Severity;
use crate::store::{ConnectionString, Scheme};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Store connection string (required)
    pub uri: String,

    /// Budget when a query gives no limit (default 1000)
    #[serde(default = "default_fetch_batch")]
    pub fetch_batch: u64,

    /// Minimum log severity (default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fixture directory for `memory://` stores
    #[serde(default)]
    pub seed_dir: Option<PathBuf>,
}

fn default_fetch_batch() -> u64 {
    DEFAULT_FETCH_BATCH
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Creates a configuration with defaults for everything but the uri
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            fetch_batch: default_fetch_batch(),
            log_level: default_log_level(),
            seed_dir: None,
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> QueryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            QueryError::configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(content: &str) -> QueryResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| QueryError::configuration(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> QueryResult<()> {
        if self.fetch_batch == 0 {
            return Err(QueryError::configuration("fetch_batch must be > 0"));
        }

        self.log_severity()?;

        let uri = self.connection_string()?;
        if self.seed_dir.is_some() && uri.scheme() != Scheme::Memory {
            return Err(QueryError::configuration(
                "seed_dir is only supported with memory:// stores",
            ));
        }

        Ok(())
    }

    /// Parsed connection string
    pub fn connection_string(&self) -> QueryResult<ConnectionString> {
        ConnectionString::parse(&self.uri)
    }

    /// Parsed log level
    pub fn log_severity(&self) -> QueryResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| QueryError::configuration(format!("Invalid log_level: {}", e)))
    }
}
