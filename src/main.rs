//! esec - Sealed-box secrets for teams.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use esec::cli::output;
use esec::cli::{execute, Cli};
use esec::error::{Error, KeyError, ShareError, VaultError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("ESEC_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("esec=debug")
        } else {
            EnvFilter::new("esec=warn")
        }
    });

    // Logs go to stderr; stdout carries decrypted values and keys.
    let json = cli.log_json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text = (!cli.log_json).then(|| {
        fmt::layer()
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();

    if let Err(e) = execute(cli.command, cli.config) {
        output::error(&e.to_string());
        if let Some(hint) = suggestion(&e) {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}

fn suggestion(e: &Error) -> Option<&'static str> {
    match e {
        Error::Key(KeyError::NoKeyFound { .. }) => Some("run: esec keygen --write"),
        Error::Key(KeyError::AmbiguousKeys(_)) => Some("unset all but one of the listed variables"),
        Error::Key(KeyError::KeyringEntryExists { .. }) => Some("pass --force to replace it"),
        Error::Vault(VaultError::EntryNotFound(_)) => Some("check --dir, --env and --format"),
        Error::Vault(VaultError::MissingPublicKey { .. }) => {
            Some("run: esec keygen --write, then add the printed public key")
        }
        Error::Vault(VaultError::SuffixCollision { .. }) => Some("rename one blob so suffixes differ beyond case"),
        Error::Share(ShareError::NotAuthorized(_)) => Some("admin grants live under [[grants]] in .esec.toml"),
        Error::Share(ShareError::UnknownUser(_)) => Some("run: esec user add <id> <public-key>"),
        Error::Share(ShareError::ProjectNotFound(_)) => Some("run: esec project create <namespace/name>"),
        _ => None,
    }
}
