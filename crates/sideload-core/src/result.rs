//! Convenience result type alias for sideload.

use crate::error::AppError;

/// A specialized `Result` type for sideload operations.
pub type AppResult<T> = Result<T, AppError>;
