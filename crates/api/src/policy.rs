//! Required-role sets for protected routes.
//!
//! Each route group names one of these; `require_roles` checks the caller's
//! role against it.

use campus_auth::Role;

pub const PLATFORM_ADMINS: &[Role] = &[Role::SuperAdmin, Role::Admin];

/// Any verified principal.
pub const AUTHENTICATED: &[Role] = &Role::ALL;
