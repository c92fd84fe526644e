//! Convenience result type alias for Glim.

use crate::error::AppError;

/// A specialized `Result` type for Glim operations.
pub type AppResult<T> = Result<T, AppError>;
