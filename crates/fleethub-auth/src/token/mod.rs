//! Bearer-token decoding and verification.

pub mod claims;
pub mod codec;

pub use claims::{Claims, UserMetadata};
pub use codec::TokenCodec;
