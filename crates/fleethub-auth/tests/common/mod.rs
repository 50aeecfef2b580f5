//! Shared helpers for gate integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{EncodingKey, Header, encode};

use fleethub_auth::{KeyFetcher, TokenError};

/// Shared secret used to sign test tokens.
pub const SECRET: &str = "S";

/// Key id published in the test key set.
pub const KID: &str = "fleet-key-1";

/// Signs a token payload with the given HMAC secret.
pub fn forge(secret: &str, payload: &serde_json::Value) -> String {
    encode(
        &Header::default(),
        payload,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Signs a token carrying a `kid` header, as key-set issuers do.
pub fn forge_with_kid(secret: &str, kid: &str, payload: &serde_json::Value) -> String {
    let header = Header {
        kid: Some(kid.to_string()),
        ..Header::default()
    };
    encode(&header, payload, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

/// Builds a claims payload for the expected issuer.
pub fn payload(sub: &str, role: Option<&str>) -> serde_json::Value {
    let mut value = serde_json::json!({ "sub": sub, "iss": "supabase" });
    if let Some(role) = role {
        value["user_metadata"] = serde_json::json!({ "role": role });
    }
    value
}

/// A JWKS holding one symmetric key, so signatures verify without
/// asymmetric key generation.
pub fn oct_key_set(kid: &str, secret: &str) -> JwkSet {
    serde_json::from_value(serde_json::json!({
        "keys": [{
            "kty": "oct",
            "kid": kid,
            "alg": "HS256",
            "k": URL_SAFE_NO_PAD.encode(secret.as_bytes())
        }]
    }))
    .unwrap()
}

/// Key fetcher that counts outbound fetches and can rotate or fail.
pub struct CountingFetcher {
    sets: Vec<JwkSet>,
    calls: AtomicUsize,
    delay: Duration,
    fail: bool,
}

impl CountingFetcher {
    /// Always serves the same key set.
    pub fn new(set: JwkSet) -> Self {
        Self::rotating(vec![set])
    }

    /// Serves `sets[n]` on the n-th fetch, sticking to the last one.
    pub fn rotating(sets: Vec<JwkSet>) -> Self {
        Self {
            sets,
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(20),
            fail: false,
        }
    }

    /// Fails every fetch, simulating an unreachable issuer.
    pub fn failing() -> Self {
        Self {
            sets: vec![],
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail: true,
        }
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyFetcher for CountingFetcher {
    async fn fetch(&self) -> Result<JwkSet, TokenError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        // Widen the race window so concurrent callers genuinely overlap.
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(TokenError::IssuerUnavailable);
        }
        Ok(self.sets[call.min(self.sets.len() - 1)].clone())
    }
}
