use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No verified identity on the request.
    #[error("unauthorized")]
    Unauthorized,

    /// Identity present, role not in the required set.
    #[error("forbidden: role '{role}' is not permitted")]
    Forbidden { role: Role },
}

/// Role gate for a protected operation.
///
/// - No IO
/// - No panics
/// - Absence of identity is checked before the role, so the two failures stay
///   distinguishable.
pub fn authorize(principal: Option<&Principal>, required: &[Role]) -> Result<(), AuthzError> {
    let principal = principal.ok_or(AuthzError::Unauthorized)?;

    if required.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubjectId;

    fn principal(role: Role) -> Principal {
        Principal::new(SubjectId::new("u1").unwrap(), role)
    }

    #[test]
    fn role_in_set_is_allowed() {
        let p = principal(Role::SchoolAdmin);
        assert_eq!(
            authorize(Some(&p), &[Role::SuperAdmin, Role::Admin, Role::SchoolAdmin]),
            Ok(())
        );
    }

    #[test]
    fn student_is_forbidden_from_admin_operations() {
        let p = principal(Role::Student);
        assert_eq!(
            authorize(Some(&p), &[Role::SuperAdmin, Role::Admin]),
            Err(AuthzError::Forbidden { role: Role::Student })
        );
    }

    #[test]
    fn missing_identity_is_unauthorized_not_forbidden() {
        assert_eq!(
            authorize(None, &[Role::SuperAdmin, Role::Admin]),
            Err(AuthzError::Unauthorized)
        );
        assert_eq!(authorize(None, &[]), Err(AuthzError::Unauthorized));
    }

    #[test]
    fn empty_requirement_admits_nobody() {
        let p = principal(Role::SuperAdmin);
        assert!(authorize(Some(&p), &[]).is_err());
    }
}
