//! Registered identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::cipher::PublicKey;
use crate::core::types::UserId;

/// A registered user.
///
/// The id is fixed for the identity's lifetime; the public key may be
/// rotated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub public_key: PublicKey,
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// New user registered now.
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>, public_key: PublicKey) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            public_key,
            registered_at: Utc::now(),
        }
    }

    /// Same user with a new public key.
    pub fn with_public_key(mut self, public_key: PublicKey) -> Self {
        self.public_key = public_key;
        self
    }
}
