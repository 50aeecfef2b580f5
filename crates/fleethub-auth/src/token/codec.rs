//! Token decoding and signature verification.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};

use fleethub_core::config::auth::AuthConfig;
use fleethub_core::error::AppError;

use crate::error::TokenError;
use crate::keyset::{HttpKeyFetcher, KeySetCache};

use super::claims::Claims;

/// How token signatures are checked.
enum Verifier {
    /// Local HS256 verification against a shared secret.
    Secret(DecodingKey),
    /// Verification against the issuer's published key set.
    KeySet(Arc<KeySetCache>),
    /// No signature verification. Development shortcut, opted into
    /// explicitly via `auth.allow_unverified`.
    Unverified,
}

impl Verifier {
    fn mode(&self) -> &'static str {
        match self {
            Self::Secret(_) => "secret",
            Self::KeySet(_) => "key-set",
            Self::Unverified => "unverified",
        }
    }
}

/// Decodes bearer tokens into [`Claims`], verifying signatures according
/// to the configured mode.
///
/// The issuer claim is enforced in every mode, including unverified
/// development mode: a token minted by anyone else is rejected before its
/// signature is even considered.
pub struct TokenCodec {
    /// Expected `iss` claim value.
    expected_issuer: String,
    /// Active verification mode.
    verifier: Verifier,
    /// Clock-skew leeway for expiry checks, in seconds.
    leeway: u64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("expected_issuer", &self.expected_issuer)
            .field("mode", &self.verifier.mode())
            .finish()
    }
}

impl TokenCodec {
    /// Builds a codec from configuration.
    ///
    /// Mode precedence: shared secret, then key set, then — only when
    /// `allow_unverified` is set — unverified. Refuses to construct a
    /// silently unverified codec.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        if let Some(secret) = config.jwt_secret.as_deref() {
            if secret.is_empty() {
                return Err(AppError::configuration("auth.jwt_secret must not be empty"));
            }
            return Ok(Self::with_secret(&config.issuer, secret, config.leeway_seconds));
        }

        if let Some(url) = config.jwks_url.as_deref() {
            let fetcher = HttpKeyFetcher::new(
                url,
                Duration::from_secs(config.jwks_timeout_seconds),
            )?;
            let cache = KeySetCache::new(
                Arc::new(fetcher),
                Duration::from_secs(config.jwks_ttl_seconds),
            );
            return Ok(Self::with_key_set(
                &config.issuer,
                Arc::new(cache),
                config.leeway_seconds,
            ));
        }

        if config.allow_unverified {
            return Ok(Self::unverified(&config.issuer));
        }

        Err(AppError::configuration(
            "no auth.jwt_secret or auth.jwks_url configured; \
             set auth.allow_unverified = true to explicitly run without signature verification",
        ))
    }

    /// Codec verifying HS256 signatures against a shared secret.
    pub fn with_secret(issuer: impl Into<String>, secret: &str, leeway: u64) -> Self {
        Self {
            expected_issuer: issuer.into(),
            verifier: Verifier::Secret(DecodingKey::from_secret(secret.as_bytes())),
            leeway,
        }
    }

    /// Codec verifying signatures against an issuer key set.
    pub fn with_key_set(issuer: impl Into<String>, keys: Arc<KeySetCache>, leeway: u64) -> Self {
        Self {
            expected_issuer: issuer.into(),
            verifier: Verifier::KeySet(keys),
            leeway,
        }
    }

    /// Codec that trusts structurally valid tokens without checking
    /// signatures. Never the default; see [`TokenCodec::from_config`].
    pub fn unverified(issuer: impl Into<String>) -> Self {
        tracing::warn!(
            "token signature verification is DISABLED (auth.allow_unverified); \
             any well-formed token for the expected issuer will be accepted"
        );
        Self {
            expected_issuer: issuer.into(),
            verifier: Verifier::Unverified,
            leeway: 0,
        }
    }

    /// Decodes the token structure without verifying its signature.
    ///
    /// Used to inspect `iss` and `sub` before committing to a
    /// verification path. Enforces a non-empty subject and the expected
    /// issuer; never enforces expiry.
    pub fn peek(&self, token: &str) -> Result<Claims, TokenError> {
        // Validates the header segment; claims come from the payload below.
        decode_header(token).map_err(map_decode_error)?;

        let claims = decode_unverified_claims(token)?;

        if claims.sub.is_empty() {
            tracing::debug!("token subject claim is empty");
            return Err(TokenError::Malformed);
        }

        if claims.iss.as_deref() != Some(self.expected_issuer.as_str()) {
            tracing::debug!(
                issuer = ?claims.iss,
                expected = %self.expected_issuer,
                "token issuer mismatch"
            );
            return Err(TokenError::IssuerMismatch);
        }

        Ok(claims)
    }

    /// Decodes and verifies a token according to the configured mode.
    pub async fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let unverified = self.peek(token)?;

        match &self.verifier {
            Verifier::Unverified => Ok(unverified),
            Verifier::Secret(key) => self.decode_hs256(token, key),
            Verifier::KeySet(keys) => self.decode_with_key_set(token, keys).await,
        }
    }

    fn decode_hs256(&self, token: &str, key: &DecodingKey) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, key, &self.validation(Algorithm::HS256))
            .map_err(map_decode_error)?;
        Ok(data.claims)
    }

    async fn decode_with_key_set(
        &self,
        token: &str,
        keys: &KeySetCache,
    ) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(map_decode_error)?;
        let kid = header.kid.as_deref().ok_or_else(|| {
            tracing::debug!("token header carries no kid; cannot select a verification key");
            TokenError::SignatureInvalid
        })?;

        let (key, alg) = keys.decoding_key(kid, header.alg).await?;

        let data =
            decode::<Claims>(token, &key, &self.validation(alg)).map_err(map_decode_error)?;
        Ok(data.claims)
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.leeway;
        validation.validate_aud = false;
        // `exp` is issuer-defined and optional; enforce it only when present.
        validation.required_spec_claims.clear();
        validation
    }
}

/// Decodes the payload segment without any signature check.
///
/// Trust nothing here until a verification path has run; the unverified
/// claims are only for issuer/subject inspection and for the explicit
/// development mode.
fn decode_unverified_claims(token: &str) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            tracing::debug!("token is not three dot-separated segments");
            return Err(TokenError::Malformed);
        }
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|err| {
        tracing::debug!(error = %err, "token payload is not base64url");
        TokenError::Malformed
    })?;

    serde_json::from_slice(&bytes).map_err(|err| {
        tracing::debug!(error = %err, "token payload is not a valid claim set");
        TokenError::Malformed
    })
}

/// Collapses `jsonwebtoken` failures into the gate taxonomy, logging the
/// raw error server-side so it never has to reach the caller.
fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    let mapped = match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
        _ => TokenError::Malformed,
    };
    tracing::debug!(error = %err, kind = ?mapped, "token decode failed");
    mapped
}
