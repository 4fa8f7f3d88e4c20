pub mod catalog;
pub mod health;
pub mod mockups;
pub mod projects;

use crate::error::PrintgateError;
use crate::web::errors::ApiError;

/// Parse a path segment that must be a numeric identifier. Non-numeric input
/// is a validation failure in the crate taxonomy, not a router-level 404.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ApiError(PrintgateError::validation(format!(
                "{what} must be a positive integer, got {raw:?}"
            )))
        })
}
