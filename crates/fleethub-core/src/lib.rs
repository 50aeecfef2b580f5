//! # fleethub-core
//!
//! Core crate for the FleetHub authorization gate. Contains configuration
//! schemas, logging setup, and the unified error system.
//!
//! This crate has **no** internal dependencies on other FleetHub crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
