//! Error taxonomy for the authorization gate.
//!
//! Two layers, mirroring the decision pipeline: [`TokenError`] covers
//! codec-level failures and never crosses the resolver boundary on its
//! own — the resolver wraps every one of them into
//! [`AuthError::InvalidCredential`] so transport callers see a single
//! generic 401-equivalent. Gate failures past identity resolution map to
//! 403-equivalents.

use thiserror::Error;

use fleethub_core::error::{AppError, ErrorKind};

/// Failures produced while decoding or verifying a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The string is not a structurally valid token, or required claims
    /// (non-empty `sub`) are missing.
    #[error("token is not a well-formed bearer token")]
    Malformed,
    /// Signature verification failed, or no verification key matched.
    #[error("token signature verification failed")]
    SignatureInvalid,
    /// The `exp` claim is present and in the past.
    #[error("token has expired")]
    Expired,
    /// The `iss` claim does not match the configured issuer.
    #[error("token issuer is not trusted")]
    IssuerMismatch,
    /// The issuer's key set could not be fetched. Always fails closed.
    #[error("issuer key set is unavailable")]
    IssuerUnavailable,
}

/// Failures produced by the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header was presented.
    #[error("missing authorization credential")]
    MissingCredential,
    /// The header is present but not of the form `Bearer <token>`.
    #[error("malformed authorization header")]
    MalformedHeader,
    /// The token was rejected by the codec. The underlying kind is kept
    /// for server-side logs; callers only see a generic rejection.
    #[error("invalid credential")]
    InvalidCredential(#[from] TokenError),
    /// The identity's role is not in the endpoint's allow-list.
    #[error("insufficient permissions")]
    InsufficientPermissions,
    /// The identity neither owns the resource nor holds the admin role.
    #[error("access denied")]
    AccessDenied,
}

impl AuthError {
    /// Whether this failure prevented identity resolution (401 class)
    /// rather than authorization of a known identity (403 class).
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential | Self::MalformedHeader | Self::InvalidCredential(_)
        )
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        // Messages here are echoed to callers; keep them generic and put
        // the real failure kind in `source` for server-side logs.
        match err {
            AuthError::MissingCredential
            | AuthError::MalformedHeader
            | AuthError::InvalidCredential(_) => {
                AppError::with_source(ErrorKind::Unauthorized, "Invalid or missing credentials", err)
            }
            AuthError::InsufficientPermissions => {
                AppError::with_source(ErrorKind::Forbidden, "Insufficient permissions", err)
            }
            AuthError::AccessDenied => {
                AppError::with_source(ErrorKind::Forbidden, "Access denied", err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_classification() {
        assert!(AuthError::MissingCredential.is_authentication());
        assert!(AuthError::InvalidCredential(TokenError::Expired).is_authentication());
        assert!(!AuthError::InsufficientPermissions.is_authentication());
        assert!(!AuthError::AccessDenied.is_authentication());
    }

    #[test]
    fn test_transport_mapping() {
        let unauthorized = AppError::from(AuthError::InvalidCredential(TokenError::Malformed));
        assert_eq!(unauthorized.kind, ErrorKind::Unauthorized);
        // The codec-level kind must not leak into the caller-facing message.
        assert!(!unauthorized.message.to_lowercase().contains("malformed"));

        let forbidden = AppError::from(AuthError::AccessDenied);
        assert_eq!(forbidden.kind, ErrorKind::Forbidden);
    }
}
