//! Convenience result type alias for pkghooks.

use crate::error::AppError;

/// A specialized `Result` type for pkghooks operations.
pub type AppResult<T> = Result<T, AppError>;
