// src/lib.rs
//! Continuous wavelet transform engine.
//!
//! * [`CwtTransform`] computes coefficients by direct convolution or FFT
//!   correlation, with configurable boundary handling.
//! * [`ScaleSelector`] derives scale grids from a wavelet and a signal.
//! * [`InverseCwt`] reconstructs signals directly, via FFT, per band, or
//!   assisted by an orthogonal discrete transform.
//!
//! ```
//! use std::sync::Arc;
//! use cwt_rs::{select_scales_for_rate, CwtTransform, InverseCwt, Morlet};
//!
//! let signal: Vec<f64> = (0..256).map(|i| (i as f64 * 0.3).sin()).collect();
//! let wavelet = Arc::new(Morlet::default());
//! let scales = select_scales_for_rate(&signal, wavelet.as_ref(), 1.0).unwrap();
//! let result = CwtTransform::with_defaults(wavelet.clone()).unwrap().analyze(&signal, &scales).unwrap();
//! let rebuilt = InverseCwt::new(wavelet).unwrap().reconstruct(&result).unwrap();
//! assert_eq!(rebuilt.len(), signal.len());
//! ```

pub mod config;
pub mod dwt;
pub mod error;
pub mod scales;
pub mod spectral;
pub mod utils;
pub mod wavelets;

#[cfg(feature = "python")]
mod python;

pub use config::{Algorithm, CwtConfig, InverseConfig};
pub use dwt::WaveletFilter;
pub use error::{CwtError, Result};
pub use scales::{
    frequency_range, select_scales, select_scales_for_rate, ScaleSelectionConfig, ScaleSelector, ScaleSpacing,
};
pub use spectral::{
    admissibility_constant, cwt, icwt, log_scale_weights, numerical_admissibility, Coefficients,
    ConvolutionEngine, CwtResult, CwtTransform, DiscreteReconstruction, FftCache, InverseCwt, MaxCoefficient,
    SpectralKernel,
};
pub use utils::array::BoundaryMode;
pub use wavelets::{
    wavelet_from_name, ComplexMorlet, ContinuousWavelet, DerivativeOfGaussian, Morlet, Paul, Shannon,
    WaveletFamily,
};
