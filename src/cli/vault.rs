//! Encrypt and decrypt commands.

use tracing::debug;

use crate::cli::{output, BlobArgs};
use crate::core::resolve;
use crate::core::vault::Vault;
use crate::error::Result;

/// Seal the plaintext values of a blob in place.
pub fn encrypt(args: &BlobArgs) -> Result<()> {
    let vault = Vault::open(&args.dir);
    let sealed = vault.encrypt(&args.env, args.format)?;
    let path = vault.blob_path(&args.env, args.format);

    if sealed == 0 {
        output::success(&format!("{} already sealed", output::path(path.display())));
    } else {
        output::success(&format!(
            "sealed {} value{} in {}",
            sealed,
            if sealed == 1 { "" } else { "s" },
            output::path(path.display())
        ));
    }
    Ok(())
}

/// Print a blob with every sealed value opened.
pub fn decrypt(args: &BlobArgs) -> Result<()> {
    let vault = Vault::open(&args.dir);
    let sources = resolve::env_sources();
    debug!(sources = sources.len(), "collected key sources from environment");

    let secrets = vault.decrypt(&args.env, args.format, &sources)?;
    print!("{}", secrets.render(args.format)?);
    Ok(())
}
