//! Fade parameter ranges and validation
//!
//! Single source of truth for the accepted ranges of fade inputs. Used by
//! request validation in the service and by config validation for the
//! configured defaults.

use crate::{Error, Result};

/// Lowest accepted target volume
pub const MIN_VOLUME: f32 = 0.0;

/// Highest accepted target volume
pub const MAX_VOLUME: f32 = 1.0;

/// Shortest accepted fade, in seconds
pub const MIN_DURATION_SECS: f64 = 0.1;

/// Longest accepted fade, in seconds
pub const MAX_DURATION_SECS: f64 = 60.0;

/// Default target volume when a request omits one
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Default fade duration when a request omits one
pub const DEFAULT_DURATION_SECS: f64 = 5.0;

/// Validate a target volume
///
/// # Validation
/// - Must be finite
/// - Must be in range [0.0, 1.0]
pub fn validate_volume(value: f32) -> Result<f32> {
    if !value.is_finite() || !(MIN_VOLUME..=MAX_VOLUME).contains(&value) {
        return Err(Error::InvalidInput(format!(
            "volume: value {} out of range [{:.1}, {:.1}]",
            value, MIN_VOLUME, MAX_VOLUME
        )));
    }
    Ok(value)
}

/// Validate a fade duration in seconds
///
/// # Validation
/// - Must be finite
/// - Must be in range [0.1, 60.0]
pub fn validate_duration_secs(value: f64) -> Result<f64> {
    if !value.is_finite() || !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&value) {
        return Err(Error::InvalidInput(format!(
            "duration: value {} out of range [{:.1}, {:.1}]",
            value, MIN_DURATION_SECS, MAX_DURATION_SECS
        )));
    }
    Ok(value)
}
