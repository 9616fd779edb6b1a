//! Shared range-checking helpers for measured values and material bounds.

use crate::error::CoreError;

/// Reject NaN and infinite values.
///
/// Returns a `CoreError::Validation` naming the field.
pub fn validate_finite(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// Validate an optional lower/upper bound pair.
///
/// Each present bound must be finite, and when both are present the lower
/// bound may not exceed the upper bound.
pub fn validate_bounds(lower: Option<f64>, upper: Option<f64>, name: &str) -> Result<(), CoreError> {
    if let Some(lo) = lower {
        validate_finite(lo, &format!("{name} lower bound"))?;
    }
    if let Some(hi) = upper {
        validate_finite(hi, &format!("{name} upper bound"))?;
    }
    if let (Some(lo), Some(hi)) = (lower, upper) {
        if lo > hi {
            return Err(CoreError::Validation(format!(
                "{name} lower bound {lo} exceeds upper bound {hi}"
            )));
        }
    }
    Ok(())
}
