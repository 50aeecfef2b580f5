//! # fleethub-auth
//!
//! Authentication and authorization gate for the FleetHub platform.
//! Every request passes through this crate before any handler runs:
//! bearer-token verification against the external identity issuer, role
//! policy enforcement, and per-resource ownership checks.
//!
//! ## Modules
//!
//! - `token` — bearer-token decoding and signature verification
//! - `keyset` — cached issuer key set with single-flight refresh
//! - `resolver` — `Authorization` header to validated identity
//! - `policy` — role allow-list enforcement
//! - `ownership` — per-resource ownership enforcement
//!
//! The gate never touches persistence or transport. Handlers feed it the
//! raw header value and method, then pass the resolved [`Identity`] into
//! [`check_role`] and [`check_access`] as needed; every failure maps to a
//! single 401/403-equivalent [`fleethub_core::AppError`].

pub mod error;
pub mod identity;
pub mod keyset;
pub mod ownership;
pub mod policy;
pub mod resolver;
pub mod token;

pub use error::{AuthError, TokenError};
pub use identity::{Identity, RequestIdentity, Role};
pub use keyset::{HttpKeyFetcher, KeyFetcher, KeySetCache};
pub use ownership::{Owned, Ownership, check_access, check_ownership, check_resource};
pub use policy::{check_role, require_admin};
pub use resolver::IdentityResolver;
pub use token::{Claims, TokenCodec, UserMetadata};
