// src/dwt/modwt.rs
//! Maximal overlap DWT: undecimated, circular, shift invariant.

use std::f64::consts::FRAC_1_SQRT_2;

use super::filter::WaveletFilter;
use crate::error::{CwtError, Result};

/// MODWT coefficients; every level has the signal's length.
#[derive(Debug, Clone, PartialEq)]
pub struct ModwtCoeffs {
    pub details: Vec<Vec<f64>>,
    pub smooth: Vec<f64>,
    pub filter: WaveletFilter,
}

impl ModwtCoeffs {
    pub fn levels(&self) -> usize {
        self.details.len()
    }
}

/// Filters rescaled by `1/√2` for the undecimated pyramid.
fn modwt_filters(filter: WaveletFilter) -> (Vec<f64>, Vec<f64>) {
    let g = filter.scaling_coeffs().iter().map(|c| c * FRAC_1_SQRT_2).collect();
    let h = filter.wavelet_coeffs().iter().map(|c| c * FRAC_1_SQRT_2).collect();
    (g, h)
}

/// Level-`j` filtering reads `x[(t - k·2^(j-1)) mod n]`.
pub fn modwt(signal: &[f64], filter: WaveletFilter, levels: usize) -> Result<ModwtCoeffs> {
    if signal.is_empty() {
        return Err(CwtError::EmptyInput("signal"));
    }
    let (g, h) = modwt_filters(filter);
    let n = signal.len() as isize;
    let mut smooth = signal.to_vec();
    let mut details = Vec::with_capacity(levels);

    for level in 0..levels {
        let stride = 1isize << level;
        let mut next = vec![0.0; smooth.len()];
        let mut detail = vec![0.0; smooth.len()];
        for t in 0..smooth.len() {
            let (mut v, mut w) = (0.0, 0.0);
            for (k, (&gk, &hk)) in g.iter().zip(&h).enumerate() {
                let x = smooth[(t as isize - k as isize * stride).rem_euclid(n) as usize];
                v += gk * x;
                w += hk * x;
            }
            next[t] = v;
            detail[t] = w;
        }
        details.push(detail);
        smooth = next;
    }
    Ok(ModwtCoeffs {
        details,
        smooth,
        filter,
    })
}

/// Inverts [`modwt`].
pub fn imodwt(coeffs: &ModwtCoeffs) -> Result<Vec<f64>> {
    let (g, h) = modwt_filters(coeffs.filter);
    let n = coeffs.smooth.len();
    let mut current = coeffs.smooth.clone();

    for (level, detail) in coeffs.details.iter().enumerate().rev() {
        if detail.len() != n {
            return Err(CwtError::DimensionMismatch {
                what: "MODWT detail",
                expected: n,
                actual: detail.len(),
            });
        }
        let stride = 1usize << level;
        current = (0..n)
            .map(|t| {
                g.iter()
                    .zip(&h)
                    .enumerate()
                    .map(|(k, (&gk, &hk))| {
                        let idx = (t + k * stride) % n;
                        gk * current[idx] + hk * detail[idx]
                    })
                    .sum()
            })
            .collect();
    }
    Ok(current)
}
