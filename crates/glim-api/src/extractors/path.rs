//! Typed path parameter helpers.

use glim_core::error::AppError;
use glim_core::result::AppResult;

/// Parses a numeric uid/gid path segment.
pub fn parse_id(name: &str, raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::bad_request(format!("{name} could not be parsed")))
}
