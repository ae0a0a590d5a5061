//! Command-line interface.

pub mod completions;
pub mod keygen;
pub mod output;
pub mod project;
pub mod seal;
pub mod share;
pub mod user;
pub mod vault;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::cache::KeyCache;
use crate::core::config::Config;
use crate::core::oracle::StaticOracle;
use crate::core::share::Distributor;
use crate::core::store::{self, Store};
use crate::core::vault::Format;
use crate::error::Result;

/// esec - Sealed-box secrets for teams.
#[derive(Parser)]
#[command(
    name = "esec",
    about = "Sealed-box secrets for teams",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to the config file (default: ./.esec.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Generate a key pair
    Keygen {
        /// Store the private key in the vault's keyring file
        #[arg(short, long)]
        write: bool,
        /// Environment the key is for (e.g. dev)
        #[arg(short, long, default_value = "")]
        env: String,
        /// Vault directory holding the keyring
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Replace an existing keyring entry
        #[arg(long, requires = "write")]
        force: bool,
    },

    /// Seal every plaintext value in a vault blob
    Encrypt {
        #[command(flatten)]
        blob: BlobArgs,
    },

    /// Print a vault blob with sealed values opened
    Decrypt {
        #[command(flatten)]
        blob: BlobArgs,
    },

    /// Seal one value for a public key
    Seal {
        /// Recipient public key (hex)
        public_key: String,
        /// Value to seal
        value: String,
    },

    /// Open one sealed value with your private key
    Open {
        /// Envelope in ESEC[...] form
        envelope: String,
        /// Environment whose key to use
        #[arg(short, long, default_value = "")]
        env: String,
        /// Directory holding the keyring
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage registered users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Share per-user secrets for a project
    Share {
        #[command(subcommand)]
        action: ShareAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Which blob of which vault.
#[derive(clap::Args, Debug, Clone)]
pub struct BlobArgs {
    /// Environment suffix (empty for the default blob). Upper-cased for the
    /// key variable, so suffixes must not differ only in case
    #[arg(short, long, default_value = "")]
    pub env: String,
    /// Blob format
    #[arg(short, long, value_enum, default_value_t = Format::Env)]
    pub format: Format,
    /// Vault directory
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Project subcommands.
#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project
    Create {
        /// Project id in namespace/name form
        id: String,
    },
}

/// User subcommands.
#[derive(Subcommand)]
pub enum UserAction {
    /// Register a user with their public key
    Add {
        /// Stable user id
        id: String,
        /// Public key (hex)
        public_key: String,
        /// Display name (defaults to your login name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Replace a user's public key
    Rotate {
        /// User id
        id: String,
        /// New public key (hex)
        public_key: String,
    },
}

/// Share subcommands.
#[derive(Subcommand)]
pub enum ShareAction {
    /// Replace all per-user secrets of a project
    Set {
        /// Project id
        project: String,
        /// JSON file: {"user": {"KEY": "ESEC[...]"}}, or {"KEY": "value"} with --seal-for
        file: PathBuf,
        /// Seal a flat plaintext file for these users
        #[arg(long, value_name = "USER", num_args = 1.., value_delimiter = ',')]
        seal_for: Vec<String>,
        /// Access token
        #[arg(long, env = "ESEC_TOKEN", hide_env_values = true)]
        token: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the per-user secrets of a project
    Get {
        /// Project id
        project: String,
        /// Only this user's secrets
        #[arg(short, long)]
        user: Option<String>,
        /// Access token
        #[arg(long, env = "ESEC_TOKEN", hide_env_values = true)]
        token: String,
    },
}

/// Execute a command.
pub fn execute(command: Command, config: Option<PathBuf>) -> Result<()> {
    use Command::*;

    match command {
        Keygen {
            write,
            env,
            dir,
            force,
        } => keygen::execute(write, &env, &dir, force),
        Encrypt { blob } => vault::encrypt(&blob),
        Decrypt { blob } => vault::decrypt(&blob),
        Seal { public_key, value } => seal::seal(&public_key, &value),
        Open { envelope, env, dir } => seal::open(&envelope, &env, &dir),
        Project { action } => match action {
            ProjectAction::Create { id } => project::create(&load_config(config)?, &id),
        },
        User { action } => {
            let config = load_config(config)?;
            match action {
                UserAction::Add {
                    id,
                    public_key,
                    name,
                } => user::add(&config, &id, &public_key, name),
                UserAction::Rotate { id, public_key } => user::rotate(&config, &id, &public_key),
            }
        }
        Share { action } => {
            let config = load_config(config)?;
            match action {
                ShareAction::Set {
                    project,
                    file,
                    seal_for,
                    token,
                    yes,
                } => share::set(&config, &project, &file, &seal_for, &token, yes),
                ShareAction::Get {
                    project,
                    user,
                    token,
                } => share::get(&config, &project, user.as_deref(), &token),
            }
        }
        Completions { shell } => completions::execute(shell),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(&path),
        None => Config::load(),
    }
}

/// Distributor wired from configuration.
pub(crate) type CliDistributor = Distributor<Box<dyn Store>, StaticOracle>;

pub(crate) fn distributor(config: &Config) -> Result<CliDistributor> {
    Ok(Distributor::new(
        store::open(&config.store)?,
        StaticOracle::from_grants(&config.grants),
        KeyCache::new(config.cache.ttl()),
    ))
}
