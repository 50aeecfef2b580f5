//! Claim set embedded in issuer-minted bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Role;

/// Claims payload of an accepted token.
///
/// Only the claims the gate acts on are modeled; anything else the issuer
/// embeds is ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the issuer's opaque user id.
    pub sub: String,
    /// Issuer that minted the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Expiration timestamp (seconds since epoch), when the issuer set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issuer-managed custom metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<UserMetadata>,
}

/// Custom metadata the issuer attaches under `user_metadata`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Role name assigned by the fleet administrators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    /// Role carried in the token metadata.
    ///
    /// Missing or unrecognized role values collapse to [`Role::User`].
    pub fn role(&self) -> Role {
        self.user_metadata
            .as_ref()
            .and_then(|meta| meta.role.as_deref())
            .and_then(|role| role.parse().ok())
            .unwrap_or(Role::User)
    }

    /// Returns the expiration as a `DateTime<Utc>`, if set.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Checks whether this token carries an expiry in the past.
    pub fn is_expired(&self) -> bool {
        matches!(self.exp, Some(exp) if Utc::now().timestamp() >= exp)
    }
}
