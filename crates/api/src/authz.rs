//! API-side authorization guard.
//!
//! Bridges the request's optional principal extension to the pure role gate
//! in `campus-auth`.

use campus_auth::{AuthzError, Role, authorize};

use crate::context::PrincipalContext;

/// Check the request's principal against `required` and hand it back on success.
pub fn authorize_request<'a>(
    principal: Option<&'a PrincipalContext>,
    required: &[Role],
) -> Result<&'a PrincipalContext, AuthzError> {
    authorize(principal.map(PrincipalContext::principal), required)?;
    principal.ok_or(AuthzError::Unauthorized)
}
