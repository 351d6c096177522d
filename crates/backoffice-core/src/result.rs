//! Convenience result type alias for the backoffice.

use crate::error::AppError;

/// A specialized `Result` type for backoffice operations.
pub type AppResult<T> = Result<T, AppError>;
