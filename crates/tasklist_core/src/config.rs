//! Runtime configuration.
//!
//! # Responsibility
//! - Resolve backend choice, storage location and logging options from the
//!   environment, with defaults.
//! - Build the persistence adapter the configuration selects.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Callers apply command-line overrides after `from_env`.

use crate::logging::default_log_level;
use crate::persist::local::LocalTaskPersistence;
use crate::persist::remote::RemoteTaskPersistence;
use crate::persist::{PersistResult, TaskPersistence};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_BACKEND: &str = "TASKLIST_BACKEND";
pub const ENV_DB_PATH: &str = "TASKLIST_DB_PATH";
pub const ENV_API_BASE: &str = "TASKLIST_API_BASE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TASKLIST_REQUEST_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "TASKLIST_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKLIST_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "tasklist.sqlite3";
const DATA_DIR_NAME: &str = "tasklist";
const DEFAULT_API_BASE: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownBackend(String),
    InvalidTimeout(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(value) => {
                write!(f, "unknown backend `{value}`; expected local|remote")
            }
            Self::InvalidTimeout(value) => {
                write!(f, "invalid request timeout `{value}`; expected whole seconds")
            }
        }
    }
}

impl Error for ConfigError {}

/// Where the task collection lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// SQLite key-value store on this device.
    #[default]
    Local,
    /// Remote task API.
    Remote,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(ConfigError::UnknownBackend(value.to_string())),
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: Backend,
    /// Local database; also holds the theme preference in remote mode.
    pub db_path: PathBuf,
    pub api_base: String,
    /// `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            db_path: default_db_path(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = read(ENV_BACKEND) {
            config.backend = value.parse()?;
        }
        if let Some(value) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_API_BASE) {
            config.api_base = value;
        }
        if let Some(value) = read(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout = Some(parse_timeout_secs(&value)?);
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value;
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(value));
        }

        Ok(config)
    }

    /// Builds the persistence adapter for the configured backend.
    ///
    /// `conn` is only used by the local backend.
    pub fn task_persistence<'conn>(
        &self,
        conn: &'conn Connection,
    ) -> PersistResult<Box<dyn TaskPersistence + 'conn>> {
        match self.backend {
            Backend::Local => Ok(Box::new(LocalTaskPersistence::new(conn))),
            Backend::Remote => Ok(Box::new(RemoteTaskPersistence::try_new(
                &self.api_base,
                self.request_timeout,
            )?)),
        }
    }
}

/// `<data dir>/tasklist/tasklist.sqlite3`, or the temp dir when the platform
/// has no per-user data directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .unwrap_or_else(std::env::temp_dir)
        .join(DEFAULT_DB_FILE_NAME)
}

/// Parses a whole-second timeout; `0` is rejected.
pub fn parse_timeout_secs(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(value.to_string())),
    }
}
