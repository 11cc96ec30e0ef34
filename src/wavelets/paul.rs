// src/wavelets/paul.rs
use std::f64::consts::PI;

use super::base::{ComplexWavelet, ContinuousWavelet};
use crate::error::{CwtError, Result};
use crate::utils::math::ln_gamma;

/// Paul wavelet of order `m` (complex, analytic).
///
/// `psi(t) = 2ᵐ·iᵐ·m! / √(π·(2m)!) · (1 - it)^-(m+1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paul {
    order: u32,
    norm: f64,
}

impl Paul {
    pub fn new(order: u32) -> Result<Self> {
        if order == 0 {
            return Err(CwtError::NonPositive {
                name: "Paul order",
                value: 0.0,
            });
        }
        Ok(Paul {
            order,
            norm: paul_norm(order),
        })
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    /// Polar form `(amplitude, phase)` of `psi(t)`.
    fn polar(&self, t: f64) -> (f64, f64) {
        let m = f64::from(self.order);
        let amplitude = self.norm * (1.0 + t * t).powf(-(m + 1.0) / 2.0);
        let phase = m * PI / 2.0 + (m + 1.0) * t.atan();
        (amplitude, phase)
    }
}

/// `2ᵐ·m! / √(π·(2m)!)`, formed in log space so large orders stay finite.
fn paul_norm(order: u32) -> f64 {
    let m = f64::from(order);
    (m * 2f64.ln() + ln_gamma(m + 1.0) - 0.5 * (PI.ln() + ln_gamma(2.0 * m + 1.0))).exp()
}

impl Default for Paul {
    fn default() -> Self {
        // order 4 is always constructible
        Paul {
            order: 4,
            norm: paul_norm(4),
        }
    }
}

impl ContinuousWavelet for Paul {
    fn name(&self) -> String {
        format!("paul{}", self.order)
    }

    fn psi(&self, t: f64) -> f64 {
        let (amplitude, phase) = self.polar(t);
        amplitude * phase.cos()
    }

    /// Spectrum `∝ ωᵐ·e^{-ω}` peaks at `ω = m`.
    fn center_frequency(&self) -> f64 {
        f64::from(self.order) / (2.0 * PI)
    }

    /// Algebraic decay needs a wider window than the Gaussian families.
    fn bandwidth(&self) -> f64 {
        f64::from(self.order).max(2.0)
    }

    fn complex_part(&self) -> Option<&dyn ComplexWavelet> {
        Some(self)
    }
}

impl ComplexWavelet for Paul {
    fn psi_imaginary(&self, t: f64) -> f64 {
        let (amplitude, phase) = self.polar(t);
        amplitude * phase.sin()
    }
}
