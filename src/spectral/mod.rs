// src/spectral/mod.rs
pub mod admissibility;
pub mod convolution;
pub mod cwt;
pub mod discrete;
pub mod fft;
pub mod icwt;
pub mod result;

pub use admissibility::{admissibility_constant, analytic_admissibility, numerical_admissibility};
pub use convolution::ConvolutionEngine;
pub use cwt::{cwt, sample_wavelet, support_length, CwtTransform};
pub use discrete::{matched_filter, DiscreteReconstruction};
pub use fft::{FftCache, SpectralKernel};
pub use icwt::{icwt, log_scale_weights, InverseCwt};
pub use result::{Coefficients, CwtResult, MaxCoefficient};
