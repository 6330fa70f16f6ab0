//! Shared query parameter types for API handlers.

use std::ops::RangeInclusive;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// `?hours=` window selector.
#[derive(Debug, Deserialize)]
pub struct HoursParams {
    pub hours: Option<i64>,
}

/// `?days=` window selector.
#[derive(Debug, Deserialize)]
pub struct DaysParams {
    pub days: Option<i64>,
}

/// Resolve an optional window parameter against its default and allowed range.
pub fn window(
    value: Option<i64>,
    default: i64,
    allowed: RangeInclusive<i64>,
    name: &str,
) -> AppResult<i64> {
    let value = value.unwrap_or(default);
    if !allowed.contains(&value) {
        return Err(AppError::BadRequest(format!(
            "{name} must be between {} and {}",
            allowed.start(),
            allowed.end()
        )));
    }
    Ok(value)
}
