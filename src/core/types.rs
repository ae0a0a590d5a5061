//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

use std::collections::BTreeMap;

/// A secret key name (e.g., DATABASE_URL, API_KEY).
pub type SecretKey = String;

/// A stored secret value: a sealed envelope in wire form, or plaintext for
/// values the caller chose not to seal.
pub type Ciphertext = String;

/// Stable, opaque identifier of a registered user.
pub type UserId = String;

/// Named key-bearing entries visible to the process (environment-like).
pub type Sources = BTreeMap<String, String>;
