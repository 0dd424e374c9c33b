//! Engine configuration
//!
//! Loaded from a JSON file. Every field is optional:
//!
//! ```json
//! { "log_level": "info", "max_call_depth": 256, "trace_dispatch": false }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::methods::MethodError;
use crate::observability::{Logger, Severity};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for MethodError {
    fn from(err: ConfigError) -> Self {
        MethodError::Config(err.to_string())
    }
}

/// Method engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Lowest log severity written (trace, info, warn, error, fatal)
    pub log_level: String,

    /// Maximum number of nested dispatch frames on one record set
    pub max_call_depth: usize,

    /// Emit a TRACE event for every `call` and `call_super`
    pub trace_dispatch: bool,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            max_call_depth: 256,
            trace_dispatch: false,
        }
    }
}

impl OrmConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: OrmConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_call_depth must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed log level, INFO if unparsable
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    /// Apply the logging settings process-wide
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.severity());
    }
}
