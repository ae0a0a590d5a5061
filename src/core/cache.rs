//! Public-key cache.
//!
//! Holds recently loaded user public keys for a bounded time. Owned by
//! whoever needs it and passed explicitly; there is no process-wide cache.
//! Only public keys are cached, never authorization answers.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use crate::core::cipher::PublicKey;
use crate::core::types::UserId;
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
struct CachedKey {
    key: PublicKey,
    loaded_at: Instant,
}

/// TTL cache of user public keys.
#[derive(Debug)]
pub struct KeyCache {
    ttl: Duration,
    entries: Mutex<HashMap<UserId, CachedKey>>,
}

impl KeyCache {
    /// Empty cache whose entries expire after `ttl`. A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached key for `user`, or the result of `load` when missing or expired.
    ///
    /// The lock is not held while `load` runs.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` returns; failures are not cached.
    pub fn get_or_load<F>(&self, user: &str, load: F) -> Result<PublicKey>
    where
        F: FnOnce() -> Result<PublicKey>,
    {
        if let Some(entry) = self.entries.lock().get(user) {
            if entry.loaded_at.elapsed() < self.ttl {
                trace!(user, "key cache hit");
                return Ok(entry.key);
            }
        }

        trace!(user, "key cache miss");
        let key = load()?;
        if !self.ttl.is_zero() {
            self.entries.lock().insert(
                user.to_string(),
                CachedKey {
                    key,
                    loaded_at: Instant::now(),
                },
            );
        }
        Ok(key)
    }

    /// Drop the entry for `user`, e.g. after key rotation.
    pub fn invalidate(&self, user: &str) {
        if self.entries.lock().remove(user).is_some() {
            trace!(user, "key cache entry invalidated");
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries, including expired ones not yet replaced.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
