// src/wavelets/dog.rs
use std::f64::consts::PI;

use super::base::ContinuousWavelet;
use crate::error::{CwtError, Result};
use crate::utils::math::{hermite_probabilists, ln_gamma};

/// Derivative-of-Gaussian wavelet of order `m`.
///
/// `psi(t) = (-1)^(m+1) / √Γ(m+½) · dᵐ/dtᵐ exp(-t²/2)`, which expands to
/// `-He_m(t)·exp(-t²/2) / √Γ(m+½)` with the probabilists' Hermite
/// polynomial. Order 2 is the Mexican hat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeOfGaussian {
    order: u32,
    norm: f64,
}

impl DerivativeOfGaussian {
    pub fn new(order: u32) -> Result<Self> {
        if order == 0 {
            return Err(CwtError::NonPositive {
                name: "derivative order",
                value: 0.0,
            });
        }
        let norm = (-0.5 * ln_gamma(f64::from(order) + 0.5)).exp();
        Ok(DerivativeOfGaussian { order, norm })
    }

    /// The Mexican hat (second derivative).
    pub fn mexican_hat() -> Self {
        DerivativeOfGaussian {
            order: 2,
            norm: (-0.5 * ln_gamma(2.5)).exp(),
        }
    }

    pub fn order(&self) -> u32 {
        self.order
    }
}

impl ContinuousWavelet for DerivativeOfGaussian {
    fn name(&self) -> String {
        if self.order == 2 {
            "mexh".to_string()
        } else {
            format!("dog{}", self.order)
        }
    }

    fn psi(&self, t: f64) -> f64 {
        -self.norm * hermite_probabilists(self.order, t) * (-0.5 * t * t).exp()
    }

    /// Peak of `|Ψ̂(ω)| ∝ ωᵐ·e^{-ω²/2}` sits at `ω = √m`.
    fn center_frequency(&self) -> f64 {
        f64::from(self.order).sqrt() / (2.0 * PI)
    }

    fn bandwidth(&self) -> f64 {
        f64::from(self.order).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mexican_hat_shape() {
        let mexh = DerivativeOfGaussian::mexican_hat();
        assert_eq!(mexh, DerivativeOfGaussian::new(2).unwrap());
        assert_eq!(mexh.name(), "mexh");
        // 2 / (√3 · π^¼)
        assert_relative_eq!(mexh.psi(0.0), 0.8673250705840776, epsilon = 1e-10);
        assert_relative_eq!(mexh.psi(1.0), 0.0, epsilon = 1e-15);
        assert!(mexh.psi(2.0) < 0.0);
    }

    #[test]
    fn test_unit_energy() {
        for order in 1..=5 {
            let dog = DerivativeOfGaussian::new(order).unwrap();
            let step = 0.005;
            let energy: f64 = (-4000..=4000)
                .map(|i| dog.psi(i as f64 * step).powi(2))
                .sum::<f64>()
                * step;
            assert_relative_eq!(energy, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rejects_order_zero() {
        assert!(DerivativeOfGaussian::new(0).is_err());
    }
}
