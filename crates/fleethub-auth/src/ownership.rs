//! Per-resource ownership enforcement.
//!
//! Fleet resources fall into two classes: owner-scoped (drones, and
//! schedules transitively through their owning drone) and shared
//! infrastructure (bases), which any authenticated identity may act on.
//! The class is carried in [`Ownership`] so the asymmetry is visible at
//! the call site instead of being an omitted check.

use crate::error::AuthError;
use crate::identity::Identity;

/// Ownership classification of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// Owned by the subject that created it; non-admins may only act on
    /// their own.
    Subject(String),
    /// Shared infrastructure with no owning subject.
    Shared,
}

impl Ownership {
    /// Stamps ownership at creation time from the requester's identity.
    ///
    /// The owning subject is immutable for the life of the resource.
    pub fn owned_by(identity: &Identity) -> Self {
        Self::Subject(identity.subject.clone())
    }

    /// Whether this resource has no owning subject.
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared)
    }
}

/// Resource types that expose their ownership to the gate.
pub trait Owned {
    /// The resource's ownership classification.
    fn ownership(&self) -> Ownership;
}

/// Checks that the identity may act on a resource owned by
/// `owner_subject`.
///
/// Admins may act on anything; everyone else only on resources whose
/// owning subject matches their own.
pub fn check_ownership(identity: &Identity, owner_subject: &str) -> Result<(), AuthError> {
    if identity.role.is_admin() || identity.subject == owner_subject {
        Ok(())
    } else {
        Err(AuthError::AccessDenied)
    }
}

/// Checks access to a resource by its ownership classification.
///
/// Shared resources reduce to "any authenticated identity"; owner-scoped
/// resources delegate to [`check_ownership`].
pub fn check_access(identity: &Identity, ownership: &Ownership) -> Result<(), AuthError> {
    match ownership {
        Ownership::Shared => Ok(()),
        Ownership::Subject(owner) => check_ownership(identity, owner),
    }
}

/// Convenience wrapper over [`check_access`] for [`Owned`] resources.
pub fn check_resource<R: Owned>(identity: &Identity, resource: &R) -> Result<(), AuthError> {
    check_access(identity, &resource.ownership())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn user(subject: &str) -> Identity {
        Identity::new(subject, Role::User)
    }

    #[test]
    fn test_owner_may_act() {
        assert!(check_ownership(&user("u1"), "u1").is_ok());
    }

    #[test]
    fn test_non_owner_is_denied() {
        assert_eq!(
            check_ownership(&user("u2"), "u1"),
            Err(AuthError::AccessDenied)
        );
    }

    #[test]
    fn test_admin_overrides_ownership() {
        let admin = Identity::new("a1", Role::Admin);
        assert!(check_ownership(&admin, "anyone").is_ok());
    }

    #[test]
    fn test_shared_resources_need_only_authentication() {
        assert!(check_access(&user("u2"), &Ownership::Shared).is_ok());
        assert_eq!(
            check_access(&user("u2"), &Ownership::Subject("u1".to_string())),
            Err(AuthError::AccessDenied)
        );
    }

    #[test]
    fn test_ownership_stamped_from_creator() {
        let creator = user("u7");
        let ownership = Ownership::owned_by(&creator);
        assert_eq!(ownership, Ownership::Subject("u7".to_string()));
        assert!(!ownership.is_shared());

        struct Drone {
            owner_subject: String,
        }
        impl Owned for Drone {
            fn ownership(&self) -> Ownership {
                Ownership::Subject(self.owner_subject.clone())
            }
        }

        let drone = Drone {
            owner_subject: "u7".to_string(),
        };
        assert!(check_resource(&creator, &drone).is_ok());
        assert_eq!(
            check_resource(&user("u8"), &drone),
            Err(AuthError::AccessDenied)
        );
    }
}
