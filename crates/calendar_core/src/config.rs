//! TOML configuration for the calendar scheduler process.
//!
//! # Responsibility
//! - Describe logging, storage backend, queue and scheduler settings.
//! - Fill every missing field with a usable default.
//!
//! # Invariants
//! - A config returned by `from_str`/`from_file` has passed `validate()`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for `scheduler.retention_days` (about 100 years).
pub const MAX_RETENTION_DAYS: u32 = 36_600;

/// Configuration load/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "cannot parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub logger: LoggerConfig,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub scheduler: SchedulerConfig,
}

impl CalendarConfig {
    /// Loads and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parses and validates a TOML document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: CalendarConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.interval_seconds must be > 0".to_string(),
            ));
        }
        if self.scheduler.retention_days > MAX_RETENTION_DAYS {
            return Err(ConfigError::Invalid(format!(
                "scheduler.retention_days must be <= {MAX_RETENTION_DAYS}"
            )));
        }
        if self.queue.topic.trim().is_empty() {
            return Err(ConfigError::Invalid("queue.topic must not be empty".to_string()));
        }
        if self.storage.kind == StorageKind::Sql && self.storage.path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.path is required when storage.kind = \"sql\"".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files.
    pub dir: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: std::env::temp_dir()
                .join("calendar-logs")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

/// Event store backend selected at composition time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Memory,
    Sql,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// SQLite database file, required for `kind = "sql"`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub topic: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            topic: "reminders".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_seconds: u64,
    /// Events older than this many days are deleted. `0` disables cleanup.
    pub retention_days: u32,
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            retention_days: 365,
        }
    }
}
