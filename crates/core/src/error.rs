//! Error types for view, zoom and marker operations.

use thiserror::Error;

/// Errors raised synchronously by view, zoom and marker operations.
///
/// Out-of-range times, frames and pixels are not errors: conversions clamp them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PeaklineError {
    /// Samples-per-pixel must be positive and finite
    #[error("Invalid scale: {0} (samples per pixel must be positive)")]
    InvalidScale(f64),

    /// Requested scale is finer than the waveform data can show
    #[error("Zoom level {requested} is below the waveform resolution of {minimum} samples per pixel")]
    ZoomBelowResolution { requested: u32, minimum: u32 },

    /// Overview views always fit the whole waveform
    #[error("Zoom is not supported on an overview")]
    UnsupportedZoom,

    /// Marker times are negative, non-finite or reversed
    #[error("Invalid marker {id}: {reason}")]
    InvalidMarker { id: String, reason: String },

    #[error("Duplicate marker id: {0}")]
    DuplicateMarker(String),

    #[error("Marker not found: {0}")]
    MarkerNotFound(String),

    /// Viewer options that cannot be used as configured
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Malformed peak data or header
    #[error("Invalid waveform data: {0}")]
    InvalidWaveform(String),
}

/// Result type for peakline operations
pub type Result<T> = std::result::Result<T, PeaklineError>;

/// Check that a scale is usable as a divisor.
pub fn validate_scale(scale: f64) -> Result<f64> {
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(PeaklineError::InvalidScale(scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_scale() {
        assert_eq!(validate_scale(512.0), Ok(512.0));
        assert_eq!(validate_scale(0.0), Err(PeaklineError::InvalidScale(0.0)));
        assert_eq!(validate_scale(-1.0), Err(PeaklineError::InvalidScale(-1.0)));
        assert!(validate_scale(f64::NAN).is_err());
        assert!(validate_scale(f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = PeaklineError::ZoomBelowResolution { requested: 128, minimum: 256 };
        assert_eq!(
            err.to_string(),
            "Zoom level 128 is below the waveform resolution of 256 samples per pixel"
        );
    }
}
