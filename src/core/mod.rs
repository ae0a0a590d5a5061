//! Core library components.
//!
//! Everything below the CLI: the envelope format and sealed box, key
//! resolution, vaults, and the per-user distribution protocol with its store
//! and oracle seams.

pub mod cache;
pub mod cipher;
pub mod config;
pub mod constants;
pub mod domain;
pub mod env;
pub mod keyring;
pub mod oracle;
pub mod resolve;
pub mod share;
pub mod store;
pub mod types;
pub mod vault;
