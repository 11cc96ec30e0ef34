// src/error.rs
//! Error type shared by every transform, selector and reconstruction path.

use thiserror::Error;

/// Errors raised by the CWT engine.
///
/// Every variant is fatal for the call that produced it; nothing in the crate
/// retries or degrades.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CwtError {
    /// A required array was empty.
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    /// A shape parameter that must be strictly positive was not.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A scale array entry was non-positive or non-finite.
    #[error("scale at index {index} must be positive and finite, got {value}")]
    InvalidScale {
        /// Position in the scale array.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// A sample was NaN or infinite.
    #[error("{name} contains a non-finite value at index {index}")]
    NonFinite {
        /// Array name.
        name: &'static str,
        /// First offending position.
        index: usize,
    },

    /// A radix-2 transform was requested with an unsupported length.
    #[error("transform length must be a power of two, got {0}")]
    NotPowerOfTwo(usize),

    /// Two arrays that must agree in size did not.
    #[error("{what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being compared.
        what: &'static str,
        /// Required size.
        expected: usize,
        /// Provided size.
        actual: usize,
    },

    /// An accessor index fell outside the matrix.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Which axis.
        what: &'static str,
        /// Requested index.
        index: usize,
        /// Axis length.
        len: usize,
    },

    /// Lower band bound exceeds the upper bound.
    #[error("invalid range: min {min} exceeds max {max}")]
    InvalidRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// The wavelet's admissibility constant is not positive and finite.
    #[error("wavelet {wavelet} is not admissible (constant = {constant})")]
    Inadmissible {
        /// Wavelet name.
        wavelet: String,
        /// Computed constant.
        constant: f64,
    },

    /// A documented capability gap.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Any other configuration problem.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CwtError>;

/// Ensures a shape parameter is strictly positive and finite.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CwtError::NonPositive { name, value })
    }
}

/// Ensures every sample is finite.
pub(crate) fn ensure_finite(name: &'static str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(CwtError::NonFinite { name, index }),
        None => Ok(()),
    }
}

/// Validates a scale array: non-empty, every entry positive and finite.
pub(crate) fn validate_scales(scales: &[f64]) -> Result<()> {
    if scales.is_empty() {
        return Err(CwtError::EmptyInput("scales"));
    }
    for (index, &value) in scales.iter().enumerate() {
        if !(value.is_finite() && value > 0.0) {
            return Err(CwtError::InvalidScale { index, value });
        }
    }
    Ok(())
}

/// Validates a signal: non-empty and finite.
pub(crate) fn validate_signal(signal: &[f64]) -> Result<()> {
    if signal.is_empty() {
        return Err(CwtError::EmptyInput("signal"));
    }
    ensure_finite("signal", signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_validation() {
        assert!(validate_scales(&[1.0, 2.0, 4.0]).is_ok());
        assert_eq!(validate_scales(&[]), Err(CwtError::EmptyInput("scales")));
        assert_eq!(
            validate_scales(&[1.0, 0.0]),
            Err(CwtError::InvalidScale { index: 1, value: 0.0 })
        );
        assert!(matches!(
            validate_scales(&[f64::NAN]),
            Err(CwtError::InvalidScale { index: 0, .. })
        ));
    }

    #[test]
    fn test_messages_name_offending_value() {
        let err = ensure_positive("bandwidth", -2.5).unwrap_err();
        assert_eq!(err.to_string(), "bandwidth must be positive, got -2.5");
        let err = validate_signal(&[1.0, f64::INFINITY]).unwrap_err();
        assert_eq!(err.to_string(), "signal contains a non-finite value at index 1");
    }
}
