//! Persistence for projects, users, and per-user secrets.
//!
//! Every backend implements the [`Store`] trait. The backend is chosen once,
//! at construction, through [`open`]; callers only ever see the trait.
//!
//! ## Adding a New Storage Backend
//!
//! 1. Implement the `Store` trait in a new file
//! 2. Make `replace_all_per_user_secrets` a single serialized unit per project
//! 3. Add a `Backend` variant and wire it into `open`

use tracing::debug;

use crate::core::config::{Backend, StoreConfig};
use crate::core::domain::{PerUserSecrets, Project, ProjectId, User};
use crate::error::Result;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage contract for the distribution protocol.
pub trait Store: Send + Sync {
    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ProjectExists` if the id is taken.
    fn create_project(&self, id: &ProjectId) -> Result<Project>;

    /// Look up a project. `None` if it was never created.
    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>>;

    /// The project's per-user secret set.
    ///
    /// `None` means secrets were never shared; an empty set means they were
    /// shared and later cleared.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ProjectNotFound` for an unknown project.
    fn get_all_per_user_secrets(&self, project: &ProjectId) -> Result<Option<PerUserSecrets>>;

    /// Replace the whole per-user secret set of a project.
    ///
    /// Runs as one unit: concurrent replacements of the same project never
    /// interleave, and a failure leaves the previous set in place.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ProjectNotFound` for an unknown project.
    fn replace_all_per_user_secrets(&self, project: &ProjectId, secrets: &PerUserSecrets) -> Result<()>;

    /// Register a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserExists` if the id is taken.
    fn create_user(&self, user: &User) -> Result<()>;

    /// Look up a user. `None` if not registered.
    fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// Overwrite an existing user record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserNotFound` if the user is not registered.
    fn update_user(&self, user: &User) -> Result<()>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn create_project(&self, id: &ProjectId) -> Result<Project> {
        (**self).create_project(id)
    }

    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        (**self).get_project(id)
    }

    fn get_all_per_user_secrets(&self, project: &ProjectId) -> Result<Option<PerUserSecrets>> {
        (**self).get_all_per_user_secrets(project)
    }

    fn replace_all_per_user_secrets(&self, project: &ProjectId, secrets: &PerUserSecrets) -> Result<()> {
        (**self).replace_all_per_user_secrets(project, secrets)
    }

    fn create_user(&self, user: &User) -> Result<()> {
        (**self).create_user(user)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        (**self).get_user(id)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        (**self).update_user(user)
    }
}

/// Open the backend selected by `config`.
///
/// # Errors
///
/// Returns a store error if the backend cannot be opened.
pub fn open(config: &StoreConfig) -> Result<Box<dyn Store>> {
    debug!(backend = ?config.backend, "opening store");
    match config.backend {
        Backend::Memory => Ok(Box::new(MemoryStore::new())),
        Backend::Sqlite => Ok(Box::new(SqliteStore::open(&config.path)?)),
    }
}
