//! User commands.

use crate::cli::{distributor, output};
use crate::core::cipher::PublicKey;
use crate::core::config::Config;
use crate::core::domain::User;
use crate::error::Result;

/// Register a user.
pub fn add(config: &Config, id: &str, public_key: &str, name: Option<String>) -> Result<()> {
    let public_key: PublicKey = public_key.parse()?;
    let name = name.unwrap_or_else(whoami::username);

    let user = User::new(id, name, public_key);
    distributor(config)?.register_user(&user)?;

    output::success(&format!("registered {}", output::key(&user.id)));
    output::kv("name", &user.display_name);
    output::kv("fingerprint", public_key.fingerprint());
    Ok(())
}

/// Replace a user's public key.
pub fn rotate(config: &Config, id: &str, public_key: &str) -> Result<()> {
    let public_key: PublicKey = public_key.parse()?;
    let user = distributor(config)?.rotate_user_key(id, public_key)?;

    output::success(&format!("rotated key for {}", output::key(&user.id)));
    output::kv("fingerprint", public_key.fingerprint());
    output::hint("re-share project secrets so the new key can open them");
    Ok(())
}
