use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role identifier used for RBAC.
///
/// The role set is closed: a token carrying anything else fails to decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    SchoolAdmin,
    Lecturer,
    CourseRep,
    AsstCourseRep,
    Student,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::SchoolAdmin,
        Role::Lecturer,
        Role::CourseRep,
        Role::AsstCourseRep,
        Role::Student,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::SchoolAdmin => "SCHOOL_ADMIN",
            Role::Lecturer => "LECTURER",
            Role::CourseRep => "COURSE_REP",
            Role::AsstCourseRep => "ASST_COURSE_REP",
            Role::Student => "STUDENT",
        }
    }

    /// Platform administrators live in their own identity namespace; every
    /// school-scoped role shares the ordinary user namespace.
    pub fn namespace(&self) -> IdentityNamespace {
        match self {
            Role::SuperAdmin | Role::Admin => IdentityNamespace::Admin,
            _ => IdentityNamespace::User,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Partition of refresh-token bookkeeping.
///
/// Admin and user identities come from different account tables, so their
/// subject ids may collide; keeping them in separate namespaces prevents an
/// admin session listing from ever returning a student's tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityNamespace {
    Admin,
    User,
}

impl IdentityNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityNamespace::Admin => "admin",
            IdentityNamespace::User => "user",
        }
    }
}

impl core::fmt::Display for IdentityNamespace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown identity namespace '{0}'")]
pub struct UnknownNamespace(pub String);

impl FromStr for IdentityNamespace {
    type Err = UnknownNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(IdentityNamespace::Admin),
            "user" => Ok(IdentityNamespace::User),
            other => Err(UnknownNamespace(other.to_string())),
        }
    }
}
