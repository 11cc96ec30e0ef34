// src/wavelets/shannon.rs
use std::f64::consts::PI;

use super::base::ContinuousWavelet;
use crate::error::{ensure_positive, Result};
use crate::utils::math::sinc;

/// Real Shannon wavelet: an ideal band-pass of width `fb` centred on `fc`.
///
/// `psi(t) = √fb · sinc(fb·t) · cos(2π·fc·t)`. Admissible only when
/// `fc > fb/2`; otherwise the pass band reaches zero frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shannon {
    bandwidth: f64,
    center_frequency: f64,
}

impl Shannon {
    pub fn new(bandwidth: f64, center_frequency: f64) -> Result<Self> {
        Ok(Shannon {
            bandwidth: ensure_positive("bandwidth", bandwidth)?,
            center_frequency: ensure_positive("center frequency", center_frequency)?,
        })
    }
}

impl ContinuousWavelet for Shannon {
    fn name(&self) -> String {
        format!("shannon{}-{}", self.bandwidth, self.center_frequency)
    }

    fn psi(&self, t: f64) -> f64 {
        self.bandwidth.sqrt() * sinc(self.bandwidth * t) * (2.0 * PI * self.center_frequency * t).cos()
    }

    fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon() {
        let shannon = Shannon::new(1.0, 1.5).unwrap();
        assert_eq!(shannon.psi(0.0), 1.0);
        assert!(shannon.psi(1.0).abs() < 1e-12);
        assert!(Shannon::new(-1.0, 1.0).is_err());
    }
}
