//! Keygen command.
//!
//! Generates a key pair. The public key goes to stdout; the private key is
//! either printed or written to the vault's keyring.

use std::path::Path;

use tracing::info;

use crate::cli::output;
use crate::core::cipher::KeyPair;
use crate::core::constants::{self, ENV_PUBLIC_KEY};
use crate::core::keyring::Keyring;
use crate::error::{KeyError, Result};

/// Generate a key pair for `env`.
pub fn execute(write: bool, env: &str, dir: &Path, force: bool) -> Result<()> {
    let var = constants::key_var_for(env);

    if !write {
        let pair = KeyPair::generate();
        println!("{}={}", ENV_PUBLIC_KEY, pair.public);
        println!("{}={}", var, pair.private.to_hex().as_str());
        return Ok(());
    }

    let keyring = Keyring::in_dir(dir);
    if !force && keyring.contains(&var)? {
        return Err(KeyError::KeyringEntryExists {
            name: var,
            path: keyring.path().to_path_buf(),
        }
        .into());
    }

    let pair = KeyPair::generate();
    keyring.store(&var, &pair.private)?;
    info!(var = %var, key = %pair.public.fingerprint(), "key pair generated");

    println!("{}", pair.public);
    output::success(&format!(
        "stored {} in {}",
        output::key(&var),
        output::path(keyring.path().display())
    ));
    output::hint(&format!(
        "add {}={} to the vault blob",
        ENV_PUBLIC_KEY,
        pair.public
    ));
    Ok(())
}
