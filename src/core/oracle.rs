//! Role oracle.
//!
//! Answers whether a credential holds a role on a project. The real authority
//! is an external identity provider; it is modeled as the [`RoleOracle`]
//! trait so distribution logic never knows where answers come from.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::config::Grant;
use crate::core::domain::ProjectId;
use crate::error::Result;

/// Project role. Each role implies the ones ordered below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Read,
    Write,
    Admin,
}

impl Role {
    /// Whether holding `self` satisfies a requirement for `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Read => "read",
            Role::Write => "write",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Bearer token presented by a requester. `Debug` never shows the token.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for handing to the identity provider.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// External authority for project roles.
///
/// Answers are ground truth for a single call and must not be cached by
/// callers.
pub trait RoleOracle: Send + Sync {
    /// Whether `token` holds `role` (or a stronger one) on `project`.
    ///
    /// # Errors
    ///
    /// Returns an error if the authority cannot be reached. An unknown
    /// token is `Ok(false)`, not an error.
    fn has_role(&self, token: &Credential, project: &ProjectId, role: Role) -> Result<bool>;
}

impl<O: RoleOracle + ?Sized> RoleOracle for &O {
    fn has_role(&self, token: &Credential, project: &ProjectId, role: Role) -> Result<bool> {
        (**self).has_role(token, project, role)
    }
}

/// Oracle backed by a fixed grant table.
#[derive(Debug, Default)]
pub struct StaticOracle {
    grants: HashMap<(Credential, ProjectId), Role>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configured grants. Repeated grants keep the strongest role.
    pub fn from_grants(grants: &[Grant]) -> Self {
        let mut oracle = Self::new();
        for grant in grants {
            oracle.grant(grant.token.clone(), grant.project.clone(), grant.role);
        }
        oracle
    }

    /// Give `token` at least `role` on `project`.
    pub fn grant(&mut self, token: Credential, project: ProjectId, role: Role) {
        self.grants
            .entry((token, project))
            .and_modify(|held| *held = (*held).max(role))
            .or_insert(role);
    }

    /// Remove every role of `token` on `project`.
    pub fn revoke(&mut self, token: &Credential, project: &ProjectId) {
        self.grants.remove(&(token.clone(), project.clone()));
    }
}

impl RoleOracle for StaticOracle {
    fn has_role(&self, token: &Credential, project: &ProjectId, role: Role) -> Result<bool> {
        let held = self.grants.get(&(token.clone(), project.clone())).copied();
        let allowed = held.is_some_and(|held| held.satisfies(role));
        trace!(project = %project, required = %role, held = ?held, allowed, "role check");
        Ok(allowed)
    }
}
