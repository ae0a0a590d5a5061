//! Vault reader and author.
//!
//! A vault is a directory of blobs, one per environment. The default blob is
//! named after its format (`.env`, `.ejson`, `.etoml`); an environment suffix
//! is appended as `.env.dev`, `.ejson.staging`, and so on. Values inside a
//! blob are either sealed envelopes or plaintext.

mod format;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

pub use format::{Format, Secrets};

use crate::core::cipher::{self, PrivateKey, PublicKey};
use crate::core::env;
use crate::core::keyring::{resolve_with_keyring, Keyring};
use crate::core::types::Sources;
use crate::error::{Result, VaultError};

/// A vault directory.
#[derive(Debug, Clone)]
pub struct Vault {
    dir: PathBuf,
}

impl Vault {
    /// Open the vault rooted at `dir`.
    ///
    /// Nothing is read until a blob is requested.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Vault directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keyring belonging to this vault.
    pub fn keyring(&self) -> Keyring {
        Keyring::in_dir(&self.dir)
    }

    /// Path of the blob for `suffix` in `format`.
    pub fn blob_path(&self, suffix: &str, format: Format) -> PathBuf {
        if suffix.is_empty() {
            self.dir.join(format.file_name())
        } else {
            self.dir.join(format!("{}.{}", format.file_name(), suffix))
        }
    }

    /// Decrypt the blob for `suffix`.
    ///
    /// The private key comes from `sources`, falling back to the vault's
    /// keyring. Sealed values are opened; everything else passes through.
    ///
    /// # Errors
    ///
    /// - `VaultError::EntryNotFound` if there is no blob for `suffix`
    /// - `KeyError::NoKeyFound` or `KeyError::AmbiguousKeys` from key resolution
    /// - `VaultError::Parse` if the blob is not valid for `format`
    /// - `CipherError::DecryptionFailed` if a sealed value does not open
    pub fn decrypt(&self, suffix: &str, format: Format, sources: &Sources) -> Result<Secrets> {
        let path = self.existing_blob(suffix, format)?;
        let key = resolve_with_keyring(sources, suffix, &self.keyring())?;

        let contents = fs::read_to_string(&path)?;
        let mut secrets = format.parse(&path, &contents)?;
        let opened = open_secrets(&mut secrets, &key)?;

        debug!(
            path = %path.display(),
            entries = secrets.len(),
            opened,
            "vault blob decrypted"
        );
        Ok(secrets)
    }

    /// Seal every plaintext value of the blob for `suffix` in place.
    ///
    /// Values are sealed for the public key stored in the blob itself. The
    /// public key entry, names starting with `_`, and values that are already
    /// sealed are left untouched. Returns the number of newly sealed values.
    ///
    /// # Errors
    ///
    /// - `VaultError::EntryNotFound` if there is no blob for `suffix`
    /// - `VaultError::MissingPublicKey` if the blob has no public key entry
    pub fn encrypt(&self, suffix: &str, format: Format) -> Result<usize> {
        let path = self.existing_blob(suffix, format)?;
        let contents = fs::read_to_string(&path)?;
        let mut secrets = format.parse(&path, &contents)?;

        let field = format.public_key_field();
        let recipient: PublicKey = secrets
            .get(field)
            .ok_or_else(|| VaultError::MissingPublicKey {
                path: path.clone(),
                field,
            })?
            .parse()?;

        let sealed = match format {
            Format::Env => seal_env_blob(&path, &contents, &recipient)?,
            _ => {
                let sealed = seal_secrets(&mut secrets, &recipient)?;
                if sealed > 0 {
                    fs::write(&path, secrets.render(format)?)?;
                }
                sealed
            }
        };

        info!(
            path = %path.display(),
            recipient = %recipient.fingerprint(),
            sealed,
            "vault blob encrypted"
        );
        Ok(sealed)
    }

    fn existing_blob(&self, suffix: &str, format: Format) -> Result<PathBuf> {
        let path = self.blob_path(suffix, format);
        if !path.is_file() {
            return Err(VaultError::EntryNotFound(path).into());
        }
        if let Some(other) = self.case_twin(suffix, format)? {
            return Err(VaultError::SuffixCollision { path, other }.into());
        }
        Ok(path)
    }

    /// A sibling blob whose suffix matches `suffix` except for case.
    ///
    /// Both would resolve `ESEC_PRIVATE_KEY_<SUFFIX>`. Only reported when the
    /// exact name is listed too, so case-insensitive filesystems never trip it.
    fn case_twin(&self, suffix: &str, format: Format) -> Result<Option<PathBuf>> {
        if suffix.is_empty() {
            return Ok(None);
        }

        let prefix = format!("{}.", format.file_name());
        let folded = suffix.to_uppercase();
        let mut exact = false;
        let mut twin = None;

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(other) = name.to_str().and_then(|n| n.strip_prefix(prefix.as_str())) else {
                continue;
            };
            if other == suffix {
                exact = true;
            } else if other.to_uppercase() == folded {
                twin = Some(entry.path());
            }
        }

        Ok(twin.filter(|_| exact))
    }
}

/// Decrypt the `suffix` blob of `vault` in `format`.
///
/// Free-function form of [`Vault::decrypt`].
pub fn decrypt_from_vault(
    vault: &Vault,
    suffix: &str,
    format: Format,
    sources: &Sources,
) -> Result<Secrets> {
    vault.decrypt(suffix, format, sources)
}

fn open_secrets(secrets: &mut Secrets, key: &PrivateKey) -> Result<usize> {
    let mut opened = 0;
    match secrets {
        Secrets::Flat(map) => {
            for value in map.values_mut() {
                if cipher::is_sealed(value) {
                    *value = cipher::decrypt(value, key)?;
                    opened += 1;
                }
            }
        }
        Secrets::Nested(doc) => open_value(doc, key, &mut opened)?,
    }
    Ok(opened)
}

fn open_value(value: &mut Value, key: &PrivateKey, opened: &mut usize) -> Result<()> {
    match value {
        Value::String(s) if cipher::is_sealed(s.as_str()) => {
            *s = cipher::decrypt(s, key)?;
            *opened += 1;
        }
        Value::Array(items) => {
            for item in items {
                open_value(item, key, opened)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                open_value(item, key, opened)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn seal_secrets(secrets: &mut Secrets, recipient: &PublicKey) -> Result<usize> {
    let mut sealed = 0;
    match secrets {
        Secrets::Flat(map) => {
            for (name, value) in map.iter_mut() {
                if is_plaintext_name(name) || cipher::is_sealed(value) {
                    continue;
                }
                *value = cipher::encrypt(value, recipient)?;
                sealed += 1;
            }
        }
        Secrets::Nested(doc) => seal_value(doc, recipient, &mut sealed)?,
    }
    Ok(sealed)
}

fn seal_value(value: &mut Value, recipient: &PublicKey, sealed: &mut usize) -> Result<()> {
    match value {
        Value::String(s) if !cipher::is_sealed(s.as_str()) => {
            *s = cipher::encrypt(s, recipient)?;
            *sealed += 1;
        }
        Value::Array(items) => {
            for item in items {
                seal_value(item, recipient, sealed)?;
            }
        }
        Value::Object(map) => {
            for (name, item) in map.iter_mut() {
                // Plaintext names only protect their own string value.
                if is_plaintext_name(name) && item.is_string() {
                    continue;
                }
                seal_value(item, recipient, sealed)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn is_plaintext_name(name: &str) -> bool {
    name.starts_with('_') || name == Format::Env.public_key_field()
}

/// Seal env blob values line by line.
///
/// Only the value of each sealed assignment changes, so comments, blank lines
/// and repeated keys keep their place and their own plaintext.
fn seal_env_blob(path: &Path, contents: &str, recipient: &PublicKey) -> Result<usize> {
    let mut sealed = 0;
    let rewritten = env::rewrite_values(contents, |name, value| {
        if is_plaintext_name(name) || cipher::is_sealed(value) {
            return Ok(None);
        }
        sealed += 1;
        cipher::encrypt(value, recipient).map(Some)
    })?;

    if sealed > 0 {
        env::write_private(path, &rewritten)?;
    }
    Ok(sealed)
}
