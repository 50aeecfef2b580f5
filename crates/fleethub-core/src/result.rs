//! Result alias used across the FleetHub crates.

use crate::error::AppError;

/// Application-wide result type.
pub type AppResult<T> = Result<T, AppError>;
