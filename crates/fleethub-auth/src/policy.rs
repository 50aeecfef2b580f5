//! Role policy enforcement for role-gated endpoints.

use crate::error::AuthError;
use crate::identity::{Identity, Role};

/// Checks an identity against an endpoint's role allow-list.
///
/// An empty allow-list means "any authenticated identity". Pure and
/// deterministic; no side effects.
pub fn check_role(identity: &Identity, required: &[Role]) -> Result<(), AuthError> {
    if required.is_empty() || required.contains(&identity.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

/// Checks that the identity holds the admin role.
pub fn require_admin(identity: &Identity) -> Result<(), AuthError> {
    check_role(identity, &[Role::Admin])
}
