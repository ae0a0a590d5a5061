//! Project identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ShareError};

/// A validated `namespace/name` project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Validate and wrap an identifier.
    ///
    /// Both halves must be non-empty and made of ASCII alphanumerics, `-`,
    /// `_` or `.`, separated by exactly one `/`.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::InvalidProject` if the shape is wrong.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = match id.split_once('/') {
            Some((namespace, name)) => is_segment(namespace) && is_segment(name),
            None => false,
        };

        if !valid {
            return Err(ShareError::InvalidProject(id).into());
        }
        Ok(Self(id))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the slash.
    pub fn namespace(&self) -> &str {
        self.0.split_once('/').map_or("", |(ns, _)| ns)
    }

    /// The part after the slash.
    pub fn name(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, name)| name)
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProjectId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

/// A project record. The identifier is the primary key and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
}

impl Project {
    pub fn new(id: ProjectId) -> Self {
        Self { id }
    }
}
