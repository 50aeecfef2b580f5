//! Requester identity and role types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Roles recognized by the gate.
///
/// Roles come from token claims, not local storage; anything the issuer
/// sends that is not a known role collapses to `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular fleet operator, scoped to resources they own.
    User,
    /// Full access to every resource.
    Admin,
}

impl Role {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(UnknownRole),
        }
    }
}

/// Parse error for [`Role`]; callers default to [`Role::User`] on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRole;

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role")
    }
}

impl std::error::Error for UnknownRole {}

/// A validated requester identity, derived fresh from each token.
///
/// Never persisted; `subject` is the issuer's opaque user id and is never
/// empty for a successfully resolved identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque external user id (`sub` claim).
    pub subject: String,
    /// Role extracted from token metadata, defaulting to `User`.
    pub role: Role,
}

impl Identity {
    /// Creates an identity from a subject and role.
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }
}

/// Outcome of resolving one request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestIdentity {
    /// A validated identity; all downstream checks operate on it.
    Authenticated(Identity),
    /// A credential-free CORS preflight. No authorization decision is
    /// made for it; handlers must not treat it as a caller.
    Preflight,
}

impl RequestIdentity {
    /// Returns the identity, if this request carried one.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Preflight => None,
        }
    }

    /// Returns the identity or rejects a credential-free request.
    pub fn require_authenticated(&self) -> Result<&Identity, AuthError> {
        self.identity().ok_or(AuthError::MissingCredential)
    }

    /// Whether this is the preflight pass-through.
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::Preflight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_preflight_carries_no_identity() {
        let preflight = RequestIdentity::Preflight;
        assert!(preflight.identity().is_none());
        assert_eq!(
            preflight.require_authenticated(),
            Err(AuthError::MissingCredential)
        );
    }

    #[test]
    fn test_authenticated_exposes_identity() {
        let resolved = RequestIdentity::Authenticated(Identity::new("u1", Role::User));
        assert_eq!(resolved.identity().unwrap().subject, "u1");
        assert!(resolved.require_authenticated().is_ok());
    }
}
