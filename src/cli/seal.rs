//! Seal and open commands for single values.

use std::path::Path;

use crate::core::cipher::{self, PublicKey};
use crate::core::keyring::{resolve_with_keyring, Keyring};
use crate::core::resolve;
use crate::error::Result;

/// Seal `value` for `public_key` and print the envelope.
pub fn seal(public_key: &str, value: &str) -> Result<()> {
    let recipient: PublicKey = public_key.parse()?;
    println!("{}", cipher::encrypt(value, &recipient)?);
    Ok(())
}

/// Open `envelope` with the key for `env` and print the plaintext.
pub fn open(envelope: &str, env: &str, dir: &Path) -> Result<()> {
    let key = resolve_with_keyring(&resolve::env_sources(), env, &Keyring::in_dir(dir))?;
    println!("{}", cipher::decrypt(envelope.trim(), &key)?);
    Ok(())
}
