//! Identity resolution from transport-level credentials.

use http::Method;

use fleethub_core::config::auth::AuthConfig;
use fleethub_core::error::AppError;

use crate::error::AuthError;
use crate::identity::{Identity, RequestIdentity};
use crate::token::TokenCodec;

/// Turns a raw `Authorization` header value into a validated identity.
///
/// The transport layer calls [`resolve`](IdentityResolver::resolve) once
/// per request and passes the result explicitly into every downstream
/// check — there is no request-local ambient state.
#[derive(Debug)]
pub struct IdentityResolver {
    codec: TokenCodec,
}

impl IdentityResolver {
    /// Creates a resolver over an already-configured codec.
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// Creates a resolver from configuration.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Ok(Self::new(TokenCodec::from_config(config)?))
    }

    /// Resolves one request's credentials.
    ///
    /// `OPTIONS` requests pass through as [`RequestIdentity::Preflight`]
    /// without credentials, so CORS preflights are never challenged. Every
    /// other method must present `Authorization: Bearer <token>`. Codec
    /// failures are collapsed into [`AuthError::InvalidCredential`]; the
    /// specific failure kind is logged here and goes no further.
    pub async fn resolve(
        &self,
        header: Option<&str>,
        method: &Method,
    ) -> Result<RequestIdentity, AuthError> {
        if method == Method::OPTIONS {
            return Ok(RequestIdentity::Preflight);
        }

        let header = header.ok_or(AuthError::MissingCredential)?;
        let token = bearer_token(header)?;

        let claims = self.codec.decode(token).await.map_err(|err| {
            tracing::warn!(error = %err, "bearer token rejected");
            AuthError::InvalidCredential(err)
        })?;

        let role = claims.role();
        Ok(RequestIdentity::Authenticated(Identity::new(
            claims.sub, role,
        )))
    }
}

/// Extracts the token from a `Bearer <token>` header value.
///
/// Exactly one scheme prefix, one space, one non-empty token; anything
/// else is malformed.
fn bearer_token(header: &str) -> Result<&str, AuthError> {
    match header.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenError;
    use crate::identity::Role;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(TokenCodec::unverified("supabase"))
    }

    fn token(payload: &serde_json::Value) -> String {
        encode(
            &Header::default(),
            payload,
            &EncodingKey::from_secret(b"test"),
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert_eq!(bearer_token("bearer abc"), Err(AuthError::MalformedHeader));
        assert_eq!(bearer_token("Basic abc"), Err(AuthError::MalformedHeader));
        assert_eq!(bearer_token("Bearer"), Err(AuthError::MalformedHeader));
        assert_eq!(bearer_token("Bearer "), Err(AuthError::MalformedHeader));
        assert_eq!(
            bearer_token("Bearer abc def"),
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(bearer_token("abc"), Err(AuthError::MalformedHeader));
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let err = resolver().resolve(None, &Method::GET).await.unwrap_err();
        assert_eq!(err, AuthError::MissingCredential);
    }

    #[tokio::test]
    async fn test_options_passes_through_without_credentials() {
        let resolved = resolver().resolve(None, &Method::OPTIONS).await.unwrap();
        assert!(resolved.is_preflight());
    }

    #[tokio::test]
    async fn test_valid_token_resolves_identity() {
        let token = token(&serde_json::json!({
            "sub": "u1",
            "iss": "supabase",
            "user_metadata": { "role": "admin" }
        }));

        let header = format!("Bearer {token}");
        let resolved = resolver()
            .resolve(Some(header.as_str()), &Method::GET)
            .await
            .unwrap();
        let identity = resolved.identity().unwrap();
        assert_eq!(identity.subject, "u1");
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_role_defaults_to_user() {
        let token = token(&serde_json::json!({ "sub": "u2", "iss": "supabase" }));

        let header = format!("Bearer {token}");
        let resolved = resolver()
            .resolve(Some(header.as_str()), &Method::POST)
            .await
            .unwrap();
        assert_eq!(resolved.identity().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn test_codec_failures_collapse_to_invalid_credential() {
        let err = resolver()
            .resolve(Some("Bearer not-a-token"), &Method::GET)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredential(TokenError::Malformed));
        assert!(err.is_authentication());
    }
}
