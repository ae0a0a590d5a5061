//! Private key resolution.
//!
//! Picks the decryption key for an environment from named sources. Exactly
//! one candidate variable may be set: two set variables are an error, never
//! a precedence decision, so a stale key left behind after rotation surfaces
//! immediately.

use std::ffi::OsString;

use tracing::{debug, warn};

use crate::core::cipher::PrivateKey;
use crate::core::constants::{self, PRIVATE_KEYS_VAR, PRIVATE_KEY_VAR};
use crate::core::types::Sources;
use crate::error::{KeyError, Result};

/// Candidate variable names for `suffix`, in check order.
pub fn candidate_names(suffix: &str) -> Vec<String> {
    let mut names = vec![PRIVATE_KEY_VAR.to_string()];
    if !suffix.is_empty() {
        names.push(constants::suffixed_key_var(suffix));
    }
    names.push(PRIVATE_KEYS_VAR.to_string());
    names
}

/// Resolve the private key for `suffix` from `sources`.
///
/// # Errors
///
/// - `KeyError::NoKeyFound` if no candidate is set to a non-empty value
///   (a whitespace-only value counts as set)
/// - `KeyError::AmbiguousKeys` if more than one candidate is set, listing
///   every conflicting name in sorted order
/// - `KeyError::InvalidFormat` if the single candidate is not a valid key
pub fn resolve_private_key(sources: &Sources, suffix: &str) -> Result<PrivateKey> {
    let candidates = candidate_names(suffix);

    let mut present: Vec<&String> = candidates
        .iter()
        .filter(|name| sources.get(name.as_str()).is_some_and(|v| !v.is_empty()))
        .collect();

    debug!(suffix, candidates = ?candidates, present = ?present, "resolving private key");

    match present.len() {
        0 => Err(KeyError::NoKeyFound {
            checked: candidates,
            keyring: None,
        }
        .into()),
        1 => {
            let name = present[0];
            let value = &sources[name.as_str()];
            PrivateKey::parse(name, value)
        }
        _ => {
            present.sort();
            Err(KeyError::AmbiguousKeys(present.into_iter().cloned().collect()).into())
        }
    }
}

/// Collect the `ESEC_*` variables of the current process.
///
/// Never panics on non-UTF-8 entries. Unrelated variables are skipped; an
/// `ESEC_*` value that is not UTF-8 is kept lossily so it still counts as
/// set and later fails as `InvalidFormat` under its own name.
pub fn env_sources() -> Sources {
    collect_sources(std::env::vars_os())
}

fn collect_sources<I>(vars: I) -> Sources
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| {
            let name = name.into_string().ok()?;
            if !name.starts_with(constants::VAR_PREFIX) {
                return None;
            }
            let value = value.into_string().unwrap_or_else(|raw| {
                warn!(var = %name, "value is not valid UTF-8");
                raw.to_string_lossy().into_owned()
            });
            Some((name, value))
        })
        .collect()
}
