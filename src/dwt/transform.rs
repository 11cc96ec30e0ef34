// src/dwt/transform.rs
//! Periodised, decimated multilevel DWT.

use log::trace;

use super::filter::WaveletFilter;
use crate::error::{CwtError, Result};

/// Multilevel DWT coefficients. `details[0]` is the finest level.
#[derive(Debug, Clone, PartialEq)]
pub struct DwtCoeffs {
    pub approximation: Vec<f64>,
    pub details: Vec<Vec<f64>>,
    pub filter: WaveletFilter,
}

impl DwtCoeffs {
    pub fn levels(&self) -> usize {
        self.details.len()
    }

    /// Length of the signal these coefficients describe.
    pub fn signal_len(&self) -> usize {
        self.approximation.len() << self.details.len()
    }
}

/// Decomposes `signal` over `levels` levels with periodic extension.
///
/// # Errors
/// The length must be a non-zero multiple of `2^levels`.
pub fn dwt_multilevel(signal: &[f64], filter: WaveletFilter, levels: usize) -> Result<DwtCoeffs> {
    if signal.is_empty() {
        return Err(CwtError::EmptyInput("signal"));
    }
    let block = 1usize.checked_shl(levels as u32).unwrap_or(0);
    if block == 0 || signal.len() % block != 0 {
        return Err(CwtError::InvalidParameter(format!(
            "signal length {} is not a multiple of 2^{levels}",
            signal.len()
        )));
    }

    let g = filter.scaling_coeffs();
    let h = filter.wavelet_coeffs();
    let mut approximation = signal.to_vec();
    let mut details = Vec::with_capacity(levels);
    for level in 0..levels {
        let (a, d) = analysis_step(&approximation, g, &h);
        trace!("dwt level {}: {} -> {}", level + 1, approximation.len(), a.len());
        details.push(d);
        approximation = a;
    }
    Ok(DwtCoeffs {
        approximation,
        details,
        filter,
    })
}

/// Inverts [`dwt_multilevel`].
pub fn idwt_multilevel(coeffs: &DwtCoeffs) -> Result<Vec<f64>> {
    let g = coeffs.filter.scaling_coeffs();
    let h = coeffs.filter.wavelet_coeffs();
    let mut current = coeffs.approximation.clone();
    for (level, detail) in coeffs.details.iter().enumerate().rev() {
        if detail.len() != current.len() {
            return Err(CwtError::DimensionMismatch {
                what: "detail coefficients",
                expected: current.len(),
                actual: detail.len(),
            });
        }
        trace!("idwt level {}: {} -> {}", level + 1, current.len(), 2 * current.len());
        current = synthesis_step(&current, detail, g, &h);
    }
    Ok(current)
}

/// `a[k] = Σ g[l]·x[(2k+l) mod n]`, same for `d` with `h`.
fn analysis_step(x: &[f64], g: &[f64], h: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = x.len();
    let half = n / 2;
    let mut a = vec![0.0; half];
    let mut d = vec![0.0; half];
    for k in 0..half {
        for (l, (&gl, &hl)) in g.iter().zip(h).enumerate() {
            let v = x[(2 * k + l) % n];
            a[k] += gl * v;
            d[k] += hl * v;
        }
    }
    (a, d)
}

/// Adjoint of [`analysis_step`].
fn synthesis_step(a: &[f64], d: &[f64], g: &[f64], h: &[f64]) -> Vec<f64> {
    let n = 2 * a.len();
    let mut x = vec![0.0; n];
    for (k, (&ak, &dk)) in a.iter().zip(d).enumerate() {
        for (l, (&gl, &hl)) in g.iter().zip(h).enumerate() {
            x[(2 * k + l) % n] += gl * ak + hl * dk;
        }
    }
    x
}
