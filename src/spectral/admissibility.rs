// src/spectral/admissibility.rs
//! Admissibility constants `C = ∫₀^∞ |Ψ̂(ω)|² / ω dω`.
//!
//! The constant always refers to the real part `psi` of the wavelet, which
//! is what the inverse transform integrates against. Known families use a
//! closed form (or a dedicated quadrature of their analytic spectrum);
//! anything else is integrated numerically.

use log::debug;
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::error::{CwtError, Result};
use crate::utils::math::{ln_gamma, trapezoid};
use crate::wavelets::morlet::morlet_spectrum;
use crate::wavelets::{ContinuousWavelet, WaveletFamily};

const MORLET_POINTS: usize = 4096;
const NUMERIC_TIME_POINTS: usize = 8192;
const NUMERIC_FREQUENCY_POINTS: usize = 512;

/// Admissibility constant of `wavelet`.
///
/// # Errors
/// [`CwtError::Inadmissible`] when the constant is not positive and finite,
/// e.g. a Shannon wavelet whose pass band reaches zero frequency.
pub fn admissibility_constant(wavelet: &dyn ContinuousWavelet) -> Result<f64> {
    let constant = match analytic_admissibility(wavelet) {
        Some(c) => c,
        None => {
            debug!("no closed form for {}; integrating numerically", wavelet.name());
            numerical_admissibility(wavelet)
        }
    };
    if constant.is_finite() && constant > 0.0 {
        Ok(constant)
    } else {
        Err(CwtError::Inadmissible {
            wavelet: wavelet.name(),
            constant,
        })
    }
}

/// Closed-form constants for the named families, `None` for unknown ones.
pub fn analytic_admissibility(wavelet: &dyn ContinuousWavelet) -> Option<f64> {
    let fb = wavelet.bandwidth();
    let fc = wavelet.center_frequency();
    match wavelet.family() {
        WaveletFamily::Morlet => Some(morlet_admissibility(fb, fc)),
        WaveletFamily::Dog(m) => {
            let m = f64::from(m);
            Some(PI * (ln_gamma(m) - ln_gamma(m + 0.5)).exp())
        }
        // Real part of the analytic Paul wavelet
        WaveletFamily::Paul(m) => Some(PI / (2.0 * f64::from(m))),
        WaveletFamily::Shannon => {
            let low = fc - fb / 2.0;
            if low <= 0.0 {
                Some(f64::INFINITY)
            } else {
                Some(((fc + fb / 2.0) / low).ln() / (4.0 * fb))
            }
        }
        WaveletFamily::Unknown => None,
    }
}

/// `∫ |Ψ̂(e^v)|² dv` over the Morlet spectrum.
fn morlet_admissibility(bandwidth: f64, center_frequency: f64) -> f64 {
    let w0 = 2.0 * PI * center_frequency;
    let lo = 1e-6f64.ln();
    let hi = (w0 + 40.0 / bandwidth.sqrt()).ln();
    let step = (hi - lo) / (MORLET_POINTS - 1) as f64;
    let values: Vec<f64> = (0..MORLET_POINTS)
        .map(|i| morlet_spectrum(bandwidth, center_frequency, (lo + i as f64 * step).exp()).powi(2))
        .collect();
    trapezoid(&values, step)
}

/// Numerical constant from a sampled `psi`.
///
/// `Ψ̂(ω)` is evaluated by quadrature over `t ∈ [-T, T]` with
/// `T = max(16, 16·bandwidth)`, on a log-spaced grid spanning
/// `[10⁻³, 10²]·2π·fc`, then integrated in `ln ω`. Deterministic for a given
/// wavelet.
pub fn numerical_admissibility(wavelet: &dyn ContinuousWavelet) -> f64 {
    let half_width = 16f64.max(16.0 * wavelet.bandwidth());
    let dt = 2.0 * half_width / (NUMERIC_TIME_POINTS - 1) as f64;
    let samples: Vec<(f64, f64)> = (0..NUMERIC_TIME_POINTS)
        .map(|i| {
            let t = -half_width + i as f64 * dt;
            (t, wavelet.psi(t))
        })
        .collect();

    let omega_c = 2.0 * PI * wavelet.center_frequency();
    let lo = (omega_c * 1e-3).ln();
    let hi = (omega_c * 1e2).ln();
    let step = (hi - lo) / (NUMERIC_FREQUENCY_POINTS - 1) as f64;

    let values: Vec<f64> = (0..NUMERIC_FREQUENCY_POINTS)
        .into_par_iter()
        .map(|k| {
            let omega = (lo + k as f64 * step).exp();
            let (re, im) = samples.iter().fold((0.0, 0.0), |(re, im), &(t, psi)| {
                let (sin, cos) = (omega * t).sin_cos();
                (re + psi * cos, im - psi * sin)
            });
            (re * re + im * im) * dt * dt
        })
        .collect();
    trapezoid(&values, step)
}
