//! Configuration for tracing and log output

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::state_dir::StateDir;

/// Main instrumentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name attached to log output
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log level filter (e.g., "info", "debug", "trace")
    pub log_level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
    /// Optional log file; when absent logs go to stderr only
    #[serde(default)]
    pub file: Option<LogFileConfig>,
}

/// File-based logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogFileConfig {
    /// Directory where the log file is written
    pub directory: PathBuf,
    /// Log file name (e.g., "stockroom.log")
    pub file_name: String,
    /// Whether to also output logs to the console
    pub console_enabled: bool,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "stockroom".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            directory: StateDir::new().logs_dir(),
            file_name: "stockroom.log".to_string(),
            console_enabled: cfg!(debug_assertions), // Console enabled in debug, not in release
        }
    }
}

impl LogFileConfig {
    /// Full path of the log file
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

impl InstrumentationConfig {
    /// Write logs to the given file in addition to (optionally) the console
    #[must_use]
    pub fn with_file(mut self, file: LogFileConfig) -> Self {
        self.file = Some(file);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InstrumentationConfig::default();
        assert_eq!(config.service_name, "stockroom");
        assert_eq!(config.service_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.log_level, "info");
        assert!(!config.json);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_log_file_path() {
        let config = LogFileConfig {
            directory: PathBuf::from("/tmp/stockroom-logs"),
            file_name: "cli.log".to_string(),
            console_enabled: false,
        };

        assert_eq!(config.path(), PathBuf::from("/tmp/stockroom-logs/cli.log"));

        let instrumentation = InstrumentationConfig::default().with_file(config);
        assert!(instrumentation.file.is_some());
    }

    #[test]
    fn test_log_file_config_default() {
        let config = LogFileConfig::default();
        assert_eq!(config.file_name, "stockroom.log");
        assert_eq!(config.console_enabled, cfg!(debug_assertions));
        assert!(config.directory.ends_with("logs"));
    }
}
