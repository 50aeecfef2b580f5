//! Issuer key-set cache for tokens signed against a rotating key set.
//!
//! The cache is an explicitly owned object constructed once at process
//! start and injected into the codec — no module-level globals. Reads go
//! through an `RwLock`; refreshes serialize behind a `Mutex` with a
//! generation double-check so any number of concurrent cold requests
//! collapse to a single outbound fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use fleethub_core::error::AppError;

use crate::error::TokenError;

/// Source of the issuer's published verification keys.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    /// Fetch the current key set from the issuer.
    async fn fetch(&self) -> Result<JwkSet, TokenError>;
}

/// Fetches the key set from the issuer's HTTPS JWKS endpoint.
pub struct HttpKeyFetcher {
    /// HTTP client with the configured request timeout baked in.
    client: reqwest::Client,
    /// JWKS endpoint URL.
    url: String,
}

impl HttpKeyFetcher {
    /// Creates a fetcher with a bounded per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(
                    fleethub_core::error::ErrorKind::Configuration,
                    "failed to build key-set HTTP client",
                    e,
                )
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch(&self) -> Result<JwkSet, TokenError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|err| {
                tracing::warn!(error = %err, url = %self.url, "issuer key set fetch failed");
                TokenError::IssuerUnavailable
            })?;

        response.json::<JwkSet>().await.map_err(|err| {
            tracing::warn!(error = %err, url = %self.url, "issuer key set body undecodable");
            TokenError::IssuerUnavailable
        })
    }
}

/// A fetched key set plus the instant it was fetched.
struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Read-mostly cache of the issuer's key set.
///
/// Lazily populated on first use, refreshed once entries outlive the TTL
/// or when a token references a `kid` the cached set does not contain
/// (possible key rotation). Fetch failures fail closed.
pub struct KeySetCache {
    fetcher: Arc<dyn KeyFetcher>,
    ttl: Duration,
    cached: RwLock<Option<CachedKeys>>,
    /// Serializes refreshes; see [`KeySetCache::refresh`].
    refresh_lock: Mutex<()>,
    /// Bumped on every successful refresh; lets waiters detect that the
    /// fetch they queued up for already happened.
    generation: AtomicU64,
}

impl KeySetCache {
    /// Creates a cache over the given fetcher.
    pub fn new(fetcher: Arc<dyn KeyFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Resolves the decoding key for a token's `kid`.
    ///
    /// A miss against a fresh cache triggers one refresh before giving
    /// up; a `kid` still unknown afterwards is treated as a signature
    /// failure, not an issuer outage.
    pub async fn decoding_key(
        &self,
        kid: &str,
        header_alg: Algorithm,
    ) -> Result<(DecodingKey, Algorithm), TokenError> {
        let observed = self.generation.load(Ordering::Acquire);

        let jwk = match self.lookup(kid, true).await {
            Some(jwk) => jwk,
            None => {
                self.refresh(observed).await?;
                match self.lookup(kid, false).await {
                    Some(jwk) => jwk,
                    None => {
                        tracing::debug!(kid, "no key in issuer key set matches token kid");
                        return Err(TokenError::SignatureInvalid);
                    }
                }
            }
        };

        let key = DecodingKey::from_jwk(&jwk).map_err(|err| {
            tracing::debug!(error = %err, kid, "failed to build decoding key from JWK");
            TokenError::SignatureInvalid
        })?;

        let alg = jwk
            .common
            .key_algorithm
            .and_then(signing_algorithm)
            .unwrap_or(header_alg);

        Ok((key, alg))
    }

    async fn lookup(&self, kid: &str, require_fresh: bool) -> Option<Jwk> {
        let guard = self.cached.read().await;
        let entry = guard.as_ref()?;
        if require_fresh && entry.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        entry.keys.find(kid).cloned()
    }

    /// Refreshes the cached key set, collapsing concurrent callers to a
    /// single fetch.
    ///
    /// `observed` is the generation the caller saw before deciding a
    /// refresh was needed; if it changed while waiting for the lock,
    /// another task already fetched and this call returns immediately.
    async fn refresh(&self, observed: u64) -> Result<(), TokenError> {
        let _guard = self.refresh_lock.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            return Ok(());
        }

        let keys = self.fetcher.fetch().await?;
        let count = keys.keys.len();
        *self.cached.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        self.generation.fetch_add(1, Ordering::Release);
        tracing::debug!(count, "issuer key set refreshed");
        Ok(())
    }
}

/// Maps a JWK's declared algorithm to a signing algorithm.
///
/// Encryption-only algorithms yield `None`; the caller falls back to the
/// token header's algorithm.
fn signing_algorithm(alg: jsonwebtoken::jwk::KeyAlgorithm) -> Option<Algorithm> {
    use jsonwebtoken::jwk::KeyAlgorithm;

    match alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}
