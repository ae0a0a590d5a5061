//! Constants used throughout esec.
//!
//! Centralizes wire tags, variable names, and file names.

/// Literal tag opening every sealed envelope (`ESEC[...]`).
pub const ENVELOPE_PREFIX: &str = "ESEC";

/// Envelope schema version written by the encoder.
pub const ENVELOPE_VERSION: u8 = 1;

/// Envelope schema versions the decoder accepts.
pub const SUPPORTED_VERSIONS: &[u8] = &[ENVELOPE_VERSION];

/// Canonical private key variable.
pub const PRIVATE_KEY_VAR: &str = "ESEC_PRIVATE_KEY";

/// Legacy plural alias of [`PRIVATE_KEY_VAR`].
pub const PRIVATE_KEYS_VAR: &str = "ESEC_PRIVATE_KEYS";

/// Prefix shared by every variable esec reads from the environment.
pub const VAR_PREFIX: &str = "ESEC_";

/// Keyring file, relative to the vault directory.
pub const KEYRING_FILE: &str = ".esec-keyring";

/// Public key entry in env-format vault blobs.
pub const ENV_PUBLIC_KEY: &str = "ESEC_PUBLIC_KEY";

/// Public key entry in structured (json/toml) vault blobs.
pub const STRUCTURED_PUBLIC_KEY: &str = "_ESEC_PUBLIC_KEY";

/// Configuration file name (.esec.toml).
pub const CONFIG_FILE: &str = ".esec.toml";

/// Default SQLite store file.
pub const DEFAULT_DB_FILE: &str = ".esec.db";

/// Default public-key cache lifetime in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Name of the suffixed private key variable for an environment.
///
/// The suffix is upper-cased to follow environment variable conventions.
pub fn suffixed_key_var(suffix: &str) -> String {
    format!("{}_{}", PRIVATE_KEY_VAR, suffix.to_uppercase())
}

/// Variable a freshly generated key for `suffix` is stored under.
pub fn key_var_for(suffix: &str) -> String {
    if suffix.is_empty() {
        PRIVATE_KEY_VAR.to_string()
    } else {
        suffixed_key_var(suffix)
    }
}
