use campus_auth::{IdentityNamespace, Principal, Role, SubjectId};

/// Principal context for a request (verified identity + role).
///
/// Inserted into request extensions by `auth_middleware` only when a valid
/// access token was presented; handlers read it as `Option<Extension<_>>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.principal.subject_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn namespace(&self) -> IdentityNamespace {
        self.principal.namespace()
    }
}
