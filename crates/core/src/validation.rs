//! Shared validation helpers.
//!
//! Range and format checks reused by thresholds, samples, rules and hosts.
//! Every helper rejects; none of them clamps or rewrites the input.

use validator::ValidateEmail;

use crate::error::CoreError;

/// Lowest accepted alert threshold percentage.
pub const MIN_THRESHOLD_PERCENT: f64 = 0.1;

/// Highest accepted alert threshold percentage.
pub const MAX_THRESHOLD_PERCENT: f64 = 100.0;

/// Validate that a threshold percentage falls within `[0.1, 100]`.
///
/// NaN and infinities are rejected as well.
pub fn validate_threshold_percent(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || !(MIN_THRESHOLD_PERCENT..=MAX_THRESHOLD_PERCENT).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between {MIN_THRESHOLD_PERCENT} and {MAX_THRESHOLD_PERCENT}, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a measured percentage falls within `[0, 100]`.
pub fn validate_measured_percent(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} out of range (0-100): {value}"
        )));
    }
    Ok(())
}

/// Normalise and validate an email address.
///
/// Returns the trimmed, lower-cased address.
pub fn normalize_email(raw: &str) -> Result<String, CoreError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(CoreError::Validation("email is required".to_string()));
    }
    if !email.validate_email() {
        return Err(CoreError::Validation(format!("invalid email address: {raw}")));
    }
    Ok(email)
}

/// Validate that an identifier-like string is not blank.
pub fn require_non_blank(value: &str, name: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{name} is required")));
    }
    Ok(())
}
