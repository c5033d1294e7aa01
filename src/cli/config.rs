//! Configuration file (`queryset.json`)
//!
//! ```json
//! {
//!   "definitions_dir": "./definitions",
//!   "data_dir": "./data",
//!   "max_sessions": 16,
//!   "query_timeout_ms": 30000,
//!   "http": { "host": "0.0.0.0", "port": 7070, "cors_origins": [] }
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `sets/`, `scripts/`, `regexes/` and `masks/` (required)
    pub definitions_dir: String,

    /// Directory of `<collection>.json` seed files (required)
    pub data_dir: String,

    /// Concurrent store sessions across all executions (default 16)
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Deadline for one set execution (default 30s)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_max_sessions() -> usize {
    16
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.definitions_dir.trim().is_empty() {
            return Err(CliError::config_error("definitions_dir must not be empty"));
        }
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }
        if self.max_sessions == 0 {
            return Err(CliError::config_error("max_sessions must be > 0"));
        }
        if self.query_timeout_ms == 0 {
            return Err(CliError::config_error("query_timeout_ms must be > 0"));
        }
        Ok(())
    }

    pub fn definitions_path(&self) -> &Path {
        Path::new(&self.definitions_dir)
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
