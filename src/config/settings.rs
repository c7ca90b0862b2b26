//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default vision model used to propose document titles.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default base URL of the OpenAI-compatible API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration for the scan agent.
#[derive(Clone)]
pub struct Config {
    /// Folder the scanner app writes into.
    pub scan_folder: PathBuf,

    /// Credential for the content describer.
    pub api_key: String,

    /// Vision model name.
    pub model: String,

    /// Base URL of the chat-completions API.
    pub api_base: String,

    /// Delay between passes in continuous mode.
    pub check_interval: Duration,

    /// Keep running after the first pass.
    pub continuous: bool,

    /// Ignore the ledger on the first pass.
    pub force: bool,

    /// Directory holding the ledger database.
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_folder: PathBuf::new(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            check_interval: Duration::from_secs(60),
            continuous: false,
            force: false,
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("scan_folder", &self.scan_folder)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("check_interval", &self.check_interval)
            .field("continuous", &self.continuous)
            .field("force", &self.force)
            .field("data_dir", &self.data_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Create a new configuration with defaults for the given scan folder.
    #[must_use]
    pub fn new(scan_folder: impl Into<PathBuf>) -> Self {
        Self {
            scan_folder: scan_folder.into(),
            ..Self::default()
        }
    }

    /// Validate every value needed before a pass may run.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        self.validate_scan_folder()?;

        if self.api_key.trim().is_empty() {
            return Err(Error::config("OPENAI_API_KEY is required"));
        }

        if self.model.trim().is_empty() {
            return Err(Error::config("model cannot be empty"));
        }

        if self.check_interval.is_zero() {
            return Err(Error::config("check interval cannot be 0"));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Validate only the scan folder (enough for diagnostic mode).
    ///
    /// # Errors
    ///
    /// Returns an error if the folder is unset, missing or not a directory.
    pub fn validate_scan_folder(&self) -> Result<()> {
        if self.scan_folder.as_os_str().is_empty() {
            return Err(Error::config("SCAN_FOLDER_PATH is required"));
        }

        if !self.scan_folder.is_dir() {
            return Err(Error::config(format!(
                "scan folder does not exist or is not a directory: {}",
                self.scan_folder.display()
            )));
        }

        Ok(())
    }

    /// Get the path to the ledger database file.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.db")
    }
}
