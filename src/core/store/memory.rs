//! In-memory store.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use super::Store;
use crate::core::domain::{PerUserSecrets, Project, ProjectId, User};
use crate::core::types::UserId;
use crate::error::{Result, StoreError};

#[derive(Debug, Default)]
struct State {
    projects: HashMap<ProjectId, Project>,
    users: HashMap<UserId, User>,
    shared: HashMap<ProjectId, PerUserSecrets>,
}

/// Store that lives in process memory and is lost on drop.
///
/// A single lock guards all state, so every operation, replace-all
/// included, is serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn create_project(&self, id: &ProjectId) -> Result<Project> {
        let mut state = self.state.lock();
        if state.projects.contains_key(id) {
            return Err(StoreError::ProjectExists(id.to_string()).into());
        }
        let project = Project::new(id.clone());
        state.projects.insert(id.clone(), project.clone());
        debug!(project = %id, "project created");
        Ok(project)
    }

    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        Ok(self.state.lock().projects.get(id).cloned())
    }

    fn get_all_per_user_secrets(&self, project: &ProjectId) -> Result<Option<PerUserSecrets>> {
        let state = self.state.lock();
        if !state.projects.contains_key(project) {
            return Err(StoreError::ProjectNotFound(project.to_string()).into());
        }
        Ok(state.shared.get(project).cloned())
    }

    fn replace_all_per_user_secrets(&self, project: &ProjectId, secrets: &PerUserSecrets) -> Result<()> {
        let mut state = self.state.lock();
        if !state.projects.contains_key(project) {
            return Err(StoreError::ProjectNotFound(project.to_string()).into());
        }
        state.shared.insert(project.clone(), secrets.clone());
        debug!(
            project = %project,
            users = secrets.len(),
            values = secrets.value_count(),
            "per-user secrets replaced"
        );
        Ok(())
    }

    fn create_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.lock();
        if state.users.contains_key(&user.id) {
            return Err(StoreError::UserExists(user.id.clone()).into());
        }
        state.users.insert(user.id.clone(), user.clone());
        debug!(user = %user.id, key = %user.public_key.fingerprint(), "user created");
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.state.lock().users.get(id).cloned())
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.lock();
        match state.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                debug!(user = %user.id, key = %user.public_key.fingerprint(), "user updated");
                Ok(())
            }
            None => Err(StoreError::UserNotFound(user.id.clone()).into()),
        }
    }
}
