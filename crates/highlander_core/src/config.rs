//! Store and logging configuration.
//!
//! # Responsibility
//! - Describe where the store lives and how connections behave.
//! - Declare the backend capability that selects the lock strategy.
//! - Load and validate the combined JSON configuration file.
//!
//! # Invariants
//! - Every field has a default, so `{}` is a valid configuration.
//! - A loaded configuration has passed `validate()`.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where the store keeps its data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreLocation {
    /// Private in-memory database, gone when the store is dropped.
    #[default]
    Memory,
    /// SQLite database file.
    File { path: PathBuf },
}

/// SQLite journal mode applied to file stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Delete,
    Wal,
}

impl JournalMode {
    pub fn as_pragma(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Wal => "wal",
        }
    }
}

/// Storage configuration consumed by [`crate::db::Store::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
    /// Whether the backend serializes writers per row.
    ///
    /// `true` selects the touch-update lock strategy, `false` the lock table.
    pub row_level_locking: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::Delete,
            row_level_locking: false,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File { path: path.into() },
            ..Self::default()
        }
    }

    pub fn with_row_level_locking(mut self, enabled: bool) -> Self {
        self.row_level_locking = enabled;
        self
    }

    pub fn with_busy_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.busy_timeout_ms = timeout_ms;
        self
    }

    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let StoreLocation::File { path } = &self.location {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "store.location.path cannot be empty".to_string(),
                ));
            }
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// File logging settings. Logging stays off while `dir` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlanderConfig {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl HighlanderConfig {
    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.store.validate()?;
        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read configuration: {err}"),
            Self::Parse(err) => write!(f, "malformed configuration: {err}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
