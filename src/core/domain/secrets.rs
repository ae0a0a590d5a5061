//! Per-user secret sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Ciphertext, SecretKey, UserId};

/// Secrets of one user: key name to ciphertext.
pub type UserSecrets = BTreeMap<SecretKey, Ciphertext>;

/// Every user's secrets for one project.
///
/// Values are opaque here; callers seal them for the matching user before
/// storing. An empty set is a real value, distinct from "never shared".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerUserSecrets(BTreeMap<UserId, UserSecrets>);

impl PerUserSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one user's secrets, replacing what they had.
    pub fn insert(&mut self, user: impl Into<UserId>, secrets: UserSecrets) {
        self.0.insert(user.into(), secrets);
    }

    /// One user's secrets.
    pub fn get(&self, user: &str) -> Option<&UserSecrets> {
        self.0.get(user)
    }

    /// User ids in order.
    pub fn users(&self) -> impl Iterator<Item = &UserId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &UserSecrets)> {
        self.0.iter()
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of secret values across users.
    pub fn value_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }
}

impl From<BTreeMap<UserId, UserSecrets>> for PerUserSecrets {
    fn from(map: BTreeMap<UserId, UserSecrets>) -> Self {
        Self(map)
    }
}

impl FromIterator<(UserId, UserSecrets)> for PerUserSecrets {
    fn from_iter<T: IntoIterator<Item = (UserId, UserSecrets)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PerUserSecrets {
    type Item = (UserId, UserSecrets);
    type IntoIter = std::collections::btree_map::IntoIter<UserId, UserSecrets>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
