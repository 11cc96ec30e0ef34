// src/config.rs
//! Immutable configuration values for the forward and inverse transforms.
//!
//! Both structs are built fluently and frozen once handed to a transform:
//!
//! ```
//! use cwt_rs::{BoundaryMode, CwtConfig};
//!
//! let config = CwtConfig::new()
//!     .with_boundary(BoundaryMode::Symmetric)
//!     .with_fft_threshold(128)
//!     .with_normalize_scales(true);
//! assert_eq!(config.fft_threshold(), 128);
//! ```

use crate::error::{CwtError, Result};
use crate::utils::array::BoundaryMode;

/// Default signal length from which the FFT path is preferred.
pub const DEFAULT_FFT_THRESHOLD: usize = 64;
/// Default scale count from which rows are computed in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;
/// Default signal length from which direct convolution is blocked.
pub const DEFAULT_BLOCK_THRESHOLD: usize = 4096;
/// Default block length for blocked convolution.
pub const DEFAULT_BLOCK_SIZE: usize = 256;
/// Default signal length from which reconstruction uses the FFT path.
pub const DEFAULT_INVERSE_FFT_THRESHOLD: usize = 128;
/// Coefficients below this magnitude are skipped by direct reconstruction.
pub const DEFAULT_COEFFICIENT_TOLERANCE: f64 = 1e-10;

/// Forward algorithm hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Pick by signal length, FFT flag and wavelet kind.
    #[default]
    Auto,
    /// Always use direct convolution.
    Direct,
    /// Use the FFT path whenever the wavelet is real.
    Fft,
}

/// Configuration for [`CwtTransform`](crate::CwtTransform).
#[derive(Debug, Clone, PartialEq)]
pub struct CwtConfig {
    boundary: BoundaryMode,
    fft_enabled: bool,
    fft_threshold: usize,
    fft_size: Option<usize>,
    normalize_scales: bool,
    algorithm: Algorithm,
    parallel_threshold: usize,
    block_threshold: usize,
    block_size: usize,
}

impl CwtConfig {
    /// Creates a configuration with the defaults: periodic boundary, FFT
    /// enabled from 64 samples, `1/√scale` normalisation, automatic
    /// algorithm choice, parallel rows from 4 scales.
    pub fn new() -> Self {
        Self {
            boundary: BoundaryMode::Periodic,
            fft_enabled: true,
            fft_threshold: DEFAULT_FFT_THRESHOLD,
            fft_size: None,
            normalize_scales: true,
            algorithm: Algorithm::Auto,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            block_threshold: DEFAULT_BLOCK_THRESHOLD,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Sets how samples outside the signal are synthesised.
    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Enables or disables the FFT path.
    pub fn with_fft_enabled(mut self, enabled: bool) -> Self {
        self.fft_enabled = enabled;
        self
    }

    /// Sets the signal length from which the FFT path is used.
    pub fn with_fft_threshold(mut self, threshold: usize) -> Self {
        self.fft_threshold = threshold;
        self
    }

    /// Sets a preferred FFT length (power of two). It is used whenever it is
    /// large enough for the signal plus the widest wavelet.
    pub fn with_fft_size(mut self, size: usize) -> Self {
        self.fft_size = Some(size);
        self
    }

    /// Enables or disables the `1/√scale` factor.
    pub fn with_normalize_scales(mut self, normalize: bool) -> Self {
        self.normalize_scales = normalize;
        self
    }

    /// Forces or relaxes the algorithm choice.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the scale count from which rows are computed in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Sets the signal length from which direct convolution is blocked, and
    /// the block length.
    pub fn with_blocking(mut self, threshold: usize, block_size: usize) -> Self {
        self.block_threshold = threshold;
        self.block_size = block_size;
        self
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    pub fn fft_enabled(&self) -> bool {
        self.fft_enabled
    }

    pub fn fft_threshold(&self) -> usize {
        self.fft_threshold
    }

    pub fn fft_size(&self) -> Option<usize> {
        self.fft_size
    }

    pub fn normalize_scales(&self) -> bool {
        self.normalize_scales
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub fn block_threshold(&self) -> usize {
        self.block_threshold
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Checks the values that a builder cannot reject eagerly.
    pub fn validate(&self) -> Result<()> {
        if let Some(size) = self.fft_size {
            if size == 0 || !size.is_power_of_two() {
                return Err(CwtError::NotPowerOfTwo(size));
            }
        }
        if self.block_size == 0 {
            return Err(CwtError::InvalidParameter(
                "block size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CwtConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for [`InverseCwt`](crate::InverseCwt).
#[derive(Debug, Clone, PartialEq)]
pub struct InverseConfig {
    fft_threshold: usize,
    tolerance: f64,
    correction_weight: f64,
    dyadic_tolerance: f64,
    parallel_threshold: usize,
}

impl InverseConfig {
    /// Defaults: FFT integration from 128 samples, 1e-10 coefficient skip
    /// tolerance, 0.1 correction weight, 10% dyadic matching tolerance.
    pub fn new() -> Self {
        Self {
            fft_threshold: DEFAULT_INVERSE_FFT_THRESHOLD,
            tolerance: DEFAULT_COEFFICIENT_TOLERANCE,
            correction_weight: 0.1,
            dyadic_tolerance: 0.1,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Sets the signal length from which FFT integration is used.
    pub fn with_fft_threshold(mut self, threshold: usize) -> Self {
        self.fft_threshold = threshold;
        self
    }

    /// Sets the magnitude below which coefficients are skipped.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the weight of non-dyadic corrections in discrete-assisted
    /// reconstruction.
    pub fn with_correction_weight(mut self, weight: f64) -> Self {
        self.correction_weight = weight;
        self
    }

    /// Sets the relative distance to `2^j` accepted as dyadic.
    pub fn with_dyadic_tolerance(mut self, tolerance: f64) -> Self {
        self.dyadic_tolerance = tolerance;
        self
    }

    /// Sets the scale count from which per-scale work runs in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn fft_threshold(&self) -> usize {
        self.fft_threshold
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn correction_weight(&self) -> f64 {
        self.correction_weight
    }

    pub fn dyadic_tolerance(&self) -> f64 {
        self.dyadic_tolerance
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(CwtError::InvalidParameter(format!(
                "coefficient tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if !(self.correction_weight.is_finite() && self.correction_weight >= 0.0) {
            return Err(CwtError::InvalidParameter(format!(
                "correction weight must be finite and non-negative, got {}",
                self.correction_weight
            )));
        }
        if !(self.dyadic_tolerance > 0.0 && self.dyadic_tolerance < 1.0) {
            return Err(CwtError::InvalidParameter(format!(
                "dyadic tolerance must lie in (0, 1), got {}",
                self.dyadic_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for InverseConfig {
    fn default() -> Self {
        Self::new()
    }
}
