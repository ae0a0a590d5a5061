//! Per-user secret distribution.
//!
//! An admin replaces a project's whole per-user secret set in one call;
//! members read it back. Values are sealed by the client for each user before
//! they get here and are never opened on this side.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::cache::KeyCache;
use crate::core::cipher::{self, PublicKey};
use crate::core::domain::{PerUserSecrets, Project, ProjectId, User, UserSecrets};
use crate::core::oracle::{Credential, Role, RoleOracle};
use crate::core::store::Store;
use crate::core::types::{SecretKey, UserId};
use crate::error::{Result, ShareError, StoreError};

/// Distribution protocol over a store and a role oracle.
#[derive(Debug)]
pub struct Distributor<S: Store, O: RoleOracle> {
    store: S,
    oracle: O,
    cache: KeyCache,
}

impl<S: Store, O: RoleOracle> Distributor<S, O> {
    pub fn new(store: S, oracle: O, cache: KeyCache) -> Self {
        Self {
            store,
            oracle,
            cache,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }

    /// Create a project from a `namespace/name` identifier.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::InvalidProject` for a malformed identifier and
    /// `StoreError::ProjectExists` if it is taken.
    pub fn create_project(&self, id: &str) -> Result<Project> {
        let id = ProjectId::new(id)?;
        let project = self.store.create_project(&id)?;
        info!(project = %id, "project created");
        Ok(project)
    }

    /// Replace the project's entire per-user secret set.
    ///
    /// Users missing from `secrets` lose whatever they had. Checks run in
    /// order and nothing is written unless all pass.
    ///
    /// # Errors
    ///
    /// - `ShareError::ProjectNotFound` if the project does not exist
    /// - `ShareError::NotAuthorized` if `requester` is not a project admin
    /// - `ShareError::UnknownUser` if a user in `secrets` is not registered
    pub fn set_per_user_secrets(
        &self,
        project: &ProjectId,
        requester: &Credential,
        secrets: PerUserSecrets,
    ) -> Result<()> {
        if self.store.get_project(project)?.is_none() {
            return Err(ShareError::ProjectNotFound(project.to_string()).into());
        }

        if !self.oracle.has_role(requester, project, Role::Admin)? {
            debug!(project = %project, "set refused: requester is not admin");
            return Err(ShareError::NotAuthorized(project.to_string()).into());
        }

        for user in secrets.users() {
            if self.store.get_user(user)?.is_none() {
                return Err(ShareError::UnknownUser(user.clone()).into());
            }
        }

        self.store.replace_all_per_user_secrets(project, &secrets)?;
        info!(
            project = %project,
            users = secrets.len(),
            values = secrets.value_count(),
            "per-user secrets replaced"
        );
        Ok(())
    }

    /// The project's per-user secret set.
    ///
    /// A missing project, a project that never had secrets shared, and a
    /// requester without read access all look the same to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::NotFound` in each of those cases.
    pub fn get_per_user_secrets(&self, project: &ProjectId, requester: &Credential) -> Result<PerUserSecrets> {
        let not_found = || ShareError::NotFound(project.to_string());

        if self.store.get_project(project)?.is_none() {
            return Err(not_found().into());
        }

        if !self.oracle.has_role(requester, project, Role::Read)? {
            debug!(project = %project, "get refused: requester has no read access");
            return Err(not_found().into());
        }

        match self.store.get_all_per_user_secrets(project)? {
            Some(secrets) => {
                debug!(project = %project, users = secrets.len(), "per-user secrets read");
                Ok(secrets)
            }
            None => Err(not_found().into()),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserExists` if the id is taken.
    pub fn register_user(&self, user: &User) -> Result<()> {
        self.store.create_user(user)?;
        info!(user = %user.id, key = %user.public_key.fingerprint(), "user registered");
        Ok(())
    }

    /// Replace a user's public key and drop the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserNotFound` if the user is not registered.
    pub fn rotate_user_key(&self, id: &str, public_key: PublicKey) -> Result<User> {
        let user = self
            .store
            .get_user(id)?
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))?
            .with_public_key(public_key);

        self.store.update_user(&user)?;
        self.cache.invalidate(id);
        info!(user = %id, key = %public_key.fingerprint(), "user key rotated");
        Ok(user)
    }

    /// A user's current public key, served from the cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserNotFound` if the user is not registered.
    pub fn public_key(&self, id: &str) -> Result<PublicKey> {
        self.cache.get_or_load(id, || {
            self.store
                .get_user(id)?
                .map(|user| user.public_key)
                .ok_or_else(|| StoreError::UserNotFound(id.to_string()).into())
        })
    }

    /// Seal every plaintext for every user in `users`.
    ///
    /// The result is ready to pass to [`Self::set_per_user_secrets`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserNotFound` if a user is not registered.
    pub fn seal_for_users(
        &self,
        plaintexts: &BTreeMap<SecretKey, String>,
        users: &[UserId],
    ) -> Result<PerUserSecrets> {
        let mut set = PerUserSecrets::new();
        for user in users {
            let key = self.public_key(user)?;
            let sealed = plaintexts
                .iter()
                .map(|(name, value)| Ok((name.clone(), cipher::encrypt(value, &key)?)))
                .collect::<Result<UserSecrets>>()?;
            set.insert(user.clone(), sealed);
        }
        debug!(users = set.len(), values = set.value_count(), "secrets sealed for users");
        Ok(set)
    }
}
