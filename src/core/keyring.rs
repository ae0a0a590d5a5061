//! Keyring file.
//!
//! A dotenv-syntax file (`.esec-keyring`) next to the vault entries that holds
//! private keys under the same variable names the environment uses. It is
//! consulted only when the environment has no key at all.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::cipher::PrivateKey;
use crate::core::constants::KEYRING_FILE;
use crate::core::env::Env;
use crate::core::resolve::resolve_private_key;
use crate::core::types::Sources;
use crate::error::{Error, KeyError, Result};

/// Keyring file belonging to one vault directory.
#[derive(Debug, Clone)]
pub struct Keyring {
    path: PathBuf,
}

impl Keyring {
    /// Keyring inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(KEYRING_FILE),
        }
    }

    /// Keyring file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the keyring file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load keyring entries, or `None` when there is no keyring file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<Sources>> {
        if !self.exists() {
            debug!(path = %self.path.display(), "no keyring file");
            return Ok(None);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = fs::metadata(&self.path)?.permissions().mode() & 0o777;
            if mode & 0o077 != 0 {
                warn!(
                    path = %self.path.display(),
                    mode = %format!("{:o}", mode),
                    "insecure keyring permissions"
                );
            }
        }

        let env = Env::load(&self.path)?;
        debug!(path = %self.path.display(), entries = env.len(), "keyring loaded");
        Ok(Some(env.entries().iter().cloned().collect()))
    }

    /// Whether the keyring has a non-empty entry called `name`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self
            .load()?
            .is_some_and(|entries| entries.get(name).is_some_and(|v| !v.is_empty())))
    }

    /// Store `key` under `name`, replacing any previous entry of that name.
    ///
    /// The file is created with owner-only permissions on Unix.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the keyring cannot be read or written.
    pub fn store(&self, name: &str, key: &PrivateKey) -> Result<()> {
        let mut env = if self.exists() {
            Env::load(&self.path)?
        } else {
            Env::default()
        };
        env.set(name, key.to_hex().to_string());
        env.save(&self.path)?;
        debug!(path = %self.path.display(), name, "keyring entry stored");
        Ok(())
    }
}

/// Resolve the key for `suffix` from `sources`, falling back to `keyring`.
///
/// Ambiguity or a malformed key in the environment is final. The keyring is
/// read only when the environment yields no key; if it yields none either,
/// the error names both the checked variables and the keyring path.
///
/// # Errors
///
/// Returns `KeyError::NoKeyFound`, `KeyError::AmbiguousKeys`, or
/// `KeyError::InvalidFormat`.
pub fn resolve_with_keyring(sources: &Sources, suffix: &str, keyring: &Keyring) -> Result<PrivateKey> {
    let checked = match resolve_private_key(sources, suffix) {
        Err(Error::Key(KeyError::NoKeyFound { checked, .. })) => checked,
        other => return other,
    };

    let not_found = || -> Error {
        KeyError::NoKeyFound {
            checked: checked.clone(),
            keyring: Some(keyring.path().to_path_buf()),
        }
        .into()
    };

    let Some(entries) = keyring.load()? else {
        return Err(not_found());
    };

    match resolve_private_key(&entries, suffix) {
        Err(Error::Key(KeyError::NoKeyFound { .. })) => Err(not_found()),
        other => {
            if other.is_ok() {
                debug!(path = %keyring.path().display(), "private key resolved from keyring");
            }
            other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::KeyPair;
    use tempfile::TempDir;

    #[test]
    fn test_environment_wins_without_reading_keyring() {
        let tmp = TempDir::new().unwrap();
        let keyring = Keyring::in_dir(tmp.path());
        fs::write(keyring.path(), "ESEC_PRIVATE_KEY=garbage\n").unwrap();

        let pair = KeyPair::generate();
        let mut sources = Sources::new();
        sources.insert("ESEC_PRIVATE_KEY".into(), pair.private.to_hex().to_string());

        let key = resolve_with_keyring(&sources, "", &keyring).unwrap();
        assert_eq!(key.public_key(), pair.public);
    }

    #[test]
    fn test_falls_back_to_keyring() {
        let tmp = TempDir::new().unwrap();
        let keyring = Keyring::in_dir(tmp.path());
        let pair = KeyPair::generate();
        keyring.store("ESEC_PRIVATE_KEY_DEV", &pair.private).unwrap();

        let key = resolve_with_keyring(&Sources::new(), "dev", &keyring).unwrap();
        assert_eq!(key.public_key(), pair.public);
    }

    #[test]
    fn test_missing_keyring_names_path() {
        let tmp = TempDir::new().unwrap();
        let keyring = Keyring::in_dir(tmp.path());

        let err = resolve_with_keyring(&Sources::new(), "", &keyring).unwrap_err();
        match err {
            Error::Key(KeyError::NoKeyFound { checked, keyring: path }) => {
                assert_eq!(checked, vec!["ESEC_PRIVATE_KEY", "ESEC_PRIVATE_KEYS"]);
                assert_eq!(path.unwrap(), tmp.path().join(".esec-keyring"));
            }
            other => panic!("expected NoKeyFound, got {other:?}"),
        }
    }

    #[test]
    fn test_keyring_ambiguity_is_reported() {
        let tmp = TempDir::new().unwrap();
        let keyring = Keyring::in_dir(tmp.path());
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        keyring.store("ESEC_PRIVATE_KEY", &a.private).unwrap();
        keyring.store("ESEC_PRIVATE_KEYS", &b.private).unwrap();

        let err = resolve_with_keyring(&Sources::new(), "", &keyring).unwrap_err();
        assert!(matches!(err, Error::Key(KeyError::AmbiguousKeys(_))));
    }

    #[test]
    fn test_environment_ambiguity_skips_keyring() {
        let tmp = TempDir::new().unwrap();
        let keyring = Keyring::in_dir(tmp.path());
        let pair = KeyPair::generate();
        keyring.store("ESEC_PRIVATE_KEY", &pair.private).unwrap();

        let mut sources = Sources::new();
        sources.insert("ESEC_PRIVATE_KEY".into(), "a".into());
        sources.insert("ESEC_PRIVATE_KEYS".into(), "b".into());

        let err = resolve_with_keyring(&sources, "", &keyring).unwrap_err();
        assert!(matches!(err, Error::Key(KeyError::AmbiguousKeys(_))));
    }

    #[test]
    fn test_whitespace_environment_value_does_not_fall_back() {
        let tmp = TempDir::new().unwrap();
        let keyring = Keyring::in_dir(tmp.path());
        let pair = KeyPair::generate();
        keyring.store("ESEC_PRIVATE_KEY", &pair.private).unwrap();

        let mut sources = Sources::new();
        sources.insert("ESEC_PRIVATE_KEY".into(), " ".into());

        let err = resolve_with_keyring(&sources, "", &keyring).unwrap_err();
        assert!(matches!(err, Error::Key(KeyError::InvalidFormat(_))));
    }

    #[test]
    fn test_contains_counts_whitespace_entry() {
        let tmp = TempDir::new().unwrap();
        let keyring = Keyring::in_dir(tmp.path());
        fs::write(keyring.path(), "ESEC_PRIVATE_KEY=\" \"\nESEC_PRIVATE_KEYS=\n").unwrap();

        assert!(keyring.contains("ESEC_PRIVATE_KEY").unwrap());
        assert!(!keyring.contains("ESEC_PRIVATE_KEYS").unwrap());
        assert!(!keyring.contains("ESEC_PRIVATE_KEY_DEV").unwrap());
    }

    #[test]
    fn test_store_replaces_entry() {
        let tmp = TempDir::new().unwrap();
        let keyring = Keyring::in_dir(tmp.path());
        let old = KeyPair::generate();
        let new = KeyPair::generate();
        keyring.store("ESEC_PRIVATE_KEY", &old.private).unwrap();
        keyring.store("ESEC_PRIVATE_KEY", &new.private).unwrap();

        let entries = keyring.load().unwrap().unwrap();
        assert_eq!(entries.len(), 1);
        let key = resolve_private_key(&entries, "").unwrap();
        assert_eq!(key.public_key(), new.public);
    }
}
