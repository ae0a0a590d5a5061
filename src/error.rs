//! Error types.
//!
//! One sub-enum per concern, wrapped by the top-level [`Error`].

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for all esec operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("toml serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("aborted: {0}")]
    Aborted(String),
}

/// Wire-format violations. Always raised before any cryptographic work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(String),
}

impl EnvelopeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}

/// Sealed-box failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Deliberately carries no cause: wrong key and corrupted data look the same.
    #[error("decryption failed")]
    DecryptionFailed,
}

/// Private key resolution and parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("no private key found (checked: {}{})", .checked.join(", "), keyring_suffix(.keyring))]
    NoKeyFound {
        checked: Vec<String>,
        keyring: Option<PathBuf>,
    },

    #[error("ambiguous private keys: {} are all set; keep exactly one", .0.join(", "))]
    AmbiguousKeys(Vec<String>),

    #[error("invalid key format in {0}: expected 32 bytes as hex or base64")]
    InvalidFormat(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("{name} already exists in {}", .path.display())]
    KeyringEntryExists { name: String, path: PathBuf },
}

fn keyring_suffix(keyring: &Option<PathBuf>) -> String {
    match keyring {
        Some(path) => format!("; keyring: {}", path.display()),
        None => String::new(),
    }
}

/// Vault lookup and content failures.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("vault entry not found: {}", .0.display())]
    EntryNotFound(PathBuf),

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("no public key in {}: add {field}", .path.display())]
    MissingPublicKey { path: PathBuf, field: &'static str },

    #[error("unknown vault format: {0} (expected env, json or toml)")]
    UnknownFormat(String),

    #[error(
        "{} and {} differ only in case and would share one private key variable",
        .path.display(),
        .other.display()
    )]
    SuffixCollision { path: PathBuf, other: PathBuf },
}

/// Store contract failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.into())
    }
}

/// Secret distribution failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("not authorized: admin role required on {0}")]
    NotAuthorized(String),

    #[error("no shared secrets found for {0}")]
    NotFound(String),

    #[error("unknown user in secret set: {0}")]
    UnknownUser(String),

    #[error("invalid project identifier: {0} (expected namespace/name)")]
    InvalidProject(String),
}

/// Configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
