//! esec - Sealed-box secrets for teams.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── keygen        # Key pair generation
//! │   ├── vault         # encrypt / decrypt vault blobs
//! │   ├── seal          # seal / open single values
//! │   ├── project       # Project creation
//! │   ├── user          # User registration and key rotation
//! │   ├── share         # Per-user secret distribution
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── cipher/       # Envelope codec, keys, sealed box
//!     ├── resolve       # Private key resolution
//!     ├── keyring       # .esec-keyring fallback
//!     ├── vault/        # Vault reader and author
//!     ├── domain/       # Projects, users, per-user secrets
//!     ├── store/        # Store trait, memory and SQLite backends
//!     ├── oracle        # Role oracle
//!     ├── cache         # Public-key cache
//!     ├── share         # Distribution protocol
//!     └── config        # .esec.toml
//! ```
//!
//! # Envelope format
//!
//! ```text
//! ESEC[1:<base64 sender public key>:<base64 nonce>:<base64 ciphertext>]
//! ```
//!
//! Every value is sealed with a fresh ephemeral key, so only the recipient's
//! private key is needed to open it.

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::cipher::{Envelope, KeyPair, PrivateKey, PublicKey, SealedBox};
pub use crate::core::share::Distributor;
pub use crate::core::vault::{decrypt_from_vault, Format, Secrets, Vault};
pub use crate::error::{Error, Result};
