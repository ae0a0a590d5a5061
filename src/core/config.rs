//! Configuration file management.
//!
//! Reads `.esec.toml`. Every section is optional; a missing file in the
//! working directory means defaults (SQLite store at `.esec.db`, a five
//! minute key cache, no grants).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::domain::ProjectId;
use crate::core::oracle::{Credential, Role};
use crate::error::{ConfigError, Result};

/// Contents of `.esec.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Static role grants for the built-in oracle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<Grant>,
}

/// Which store backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    #[default]
    Sqlite,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Database file for the sqlite backend.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: default_db_path(),
        }
    }
}

impl StoreConfig {
    /// In-memory store, mostly for tests.
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory,
            ..Self::default()
        }
    }

    /// SQLite store at `path`.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Sqlite,
            path: path.into(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(constants::DEFAULT_DB_FILE)
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds a cached public key stays valid.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_ttl_secs() -> u64 {
    constants::DEFAULT_CACHE_TTL_SECS
}

/// One `[[grants]]` entry: `token` holds `role` on `project`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Grant {
    pub token: Credential,
    pub project: ProjectId,
    pub role: Role,
}

impl Config {
    /// Path to the configuration file in the current directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from(constants::CONFIG_FILE)
    }

    /// Load `.esec.toml` from the current directory, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or invalid.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path. The file must exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file cannot be read,
    /// a TOML error if it does not parse, or `ConfigError::InvalidValue`.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        debug!(
            backend = ?config.store.backend,
            ttl_secs = config.cache.ttl_secs,
            grants = config.grants.len(),
            "config loaded"
        );
        Ok(config)
    }

    /// Check values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.store.backend == Backend::Sqlite && self.store.path.as_os_str().is_empty() {
            return Err(invalid("store.path", "must not be empty for the sqlite backend"));
        }

        for (i, grant) in self.grants.iter().enumerate() {
            if grant.token.expose().trim().is_empty() {
                return Err(invalid(format!("grants[{i}].token"), "must not be empty"));
            }
        }

        Ok(())
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> crate::error::Error {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
    .into()
}
