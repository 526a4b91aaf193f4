use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{IdentityNamespace, Role};

/// Identity of an authenticated subject (admin account, lecturer, student...).
///
/// Subject ids are issued by the account store and are opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("subject id must not be empty")]
pub struct EmptySubjectId;

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Result<Self, EmptySubjectId> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EmptySubjectId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SubjectId {
    type Err = EmptySubjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A verified identity, as recovered from an access token.
///
/// The role is the snapshot taken when the token was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: SubjectId,
    pub role: Role,
}

impl Principal {
    pub fn new(subject_id: SubjectId, role: Role) -> Self {
        Self { subject_id, role }
    }

    pub fn namespace(&self) -> IdentityNamespace {
        self.role.namespace()
    }
}
