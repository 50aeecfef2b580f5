//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token-verification and issuer configuration.
///
/// Exactly one verification mode is active at a time, selected by
/// precedence: `jwt_secret` (HS256 shared secret), then `jwks_url`
/// (issuer key set), then — only with `allow_unverified = true` —
/// structural trust with no signature check. Leaving all three unset is
/// a configuration error, never a silent fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected `iss` claim on every accepted token.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Shared HMAC secret for local HS256 signature verification.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// HTTPS endpoint publishing the issuer's JSON Web Key Set.
    #[serde(default)]
    pub jwks_url: Option<String>,
    /// Explicitly allow running without signature verification.
    ///
    /// Development shortcut only: tokens are trusted structurally. The
    /// gate refuses to start without a secret or key-set URL unless this
    /// is set, and logs a warning banner when it is.
    #[serde(default)]
    pub allow_unverified: bool,
    /// How long a fetched key set is considered fresh, in seconds.
    #[serde(default = "default_jwks_ttl")]
    pub jwks_ttl_seconds: u64,
    /// Timeout for a single key-set fetch, in seconds.
    #[serde(default = "default_jwks_timeout")]
    pub jwks_timeout_seconds: u64,
    /// Clock-skew leeway applied to expiry checks, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            jwt_secret: None,
            jwks_url: None,
            allow_unverified: false,
            jwks_ttl_seconds: default_jwks_ttl(),
            jwks_timeout_seconds: default_jwks_timeout(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_issuer() -> String {
    "supabase".to_string()
}

fn default_jwks_ttl() -> u64 {
    600
}

fn default_jwks_timeout() -> u64 {
    5
}

fn default_leeway() -> u64 {
    5
}
