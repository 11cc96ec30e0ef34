// src/wavelets/morlet.rs
use std::f64::consts::PI;

use super::base::{ComplexWavelet, ContinuousWavelet};
use crate::error::{ensure_positive, Result};

/// Real Morlet wavelet with zero-mean correction.
///
/// `psi(t) = (π·fb)^(-1/2) · exp(-t²/fb) · (cos(2π·fc·t) - κ)` with
/// `κ = exp(-π²·fc²·fb)`, so the wavelet integrates to zero for any
/// parameter choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Morlet {
    bandwidth: f64,
    center_frequency: f64,
}

impl Morlet {
    pub fn new(bandwidth: f64, center_frequency: f64) -> Result<Self> {
        Ok(Morlet {
            bandwidth: ensure_positive("bandwidth", bandwidth)?,
            center_frequency: ensure_positive("center frequency", center_frequency)?,
        })
    }

    /// Envelope norm `1/√(π·fb)` and the offset `κ = e^{-π²·fc²·fb}` that
    /// gives the wavelet zero mean.
    fn constants(&self) -> (f64, f64) {
        morlet_constants(self.bandwidth, self.center_frequency)
    }

    /// Fourier transform `Ψ̂(ω) = ∫ψ(t)e^{-iωt}dt`; real for this wavelet.
    pub fn spectrum(&self, omega: f64) -> f64 {
        morlet_spectrum(self.bandwidth, self.center_frequency, omega)
    }
}

impl Default for Morlet {
    fn default() -> Self {
        Morlet {
            bandwidth: 1.0,
            center_frequency: 1.0,
        }
    }
}

impl ContinuousWavelet for Morlet {
    fn name(&self) -> String {
        format!("morlet{}-{}", self.bandwidth, self.center_frequency)
    }

    fn psi(&self, t: f64) -> f64 {
        let (norm, kappa) = self.constants();
        let envelope = norm * (-t * t / self.bandwidth).exp();
        envelope * ((2.0 * PI * self.center_frequency * t).cos() - kappa)
    }

    fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

/// Complex Morlet wavelet.
///
/// Same envelope as [`Morlet`] times `exp(i·2π·fc·t) - κ`; its real part is
/// exactly the real Morlet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexMorlet {
    real: Morlet,
}

impl ComplexMorlet {
    pub fn new(bandwidth: f64, center_frequency: f64) -> Result<Self> {
        Ok(ComplexMorlet {
            real: Morlet::new(bandwidth, center_frequency)?,
        })
    }

    /// The real Morlet sharing this wavelet's parameters.
    pub fn real_part(&self) -> Morlet {
        self.real
    }
}

impl ContinuousWavelet for ComplexMorlet {
    fn name(&self) -> String {
        format!("cmor{}-{}", self.real.bandwidth, self.real.center_frequency)
    }

    fn psi(&self, t: f64) -> f64 {
        self.real.psi(t)
    }

    fn center_frequency(&self) -> f64 {
        self.real.center_frequency
    }

    fn bandwidth(&self) -> f64 {
        self.real.bandwidth
    }

    fn complex_part(&self) -> Option<&dyn ComplexWavelet> {
        Some(self)
    }
}

impl ComplexWavelet for ComplexMorlet {
    fn psi_imaginary(&self, t: f64) -> f64 {
        let (norm, _) = self.real.constants();
        norm * (-t * t / self.real.bandwidth).exp() * (2.0 * PI * self.real.center_frequency * t).sin()
    }
}

pub(crate) fn morlet_constants(bandwidth: f64, center_frequency: f64) -> (f64, f64) {
    let norm = (PI * bandwidth).powf(-0.5);
    let kappa = (-PI * PI * center_frequency * center_frequency * bandwidth).exp();
    (norm, kappa)
}

/// `½e^{-fb(ω-ω0)²/4} + ½e^{-fb(ω+ω0)²/4} - κ·e^{-fb·ω²/4}`, `ω0 = 2π·fc`.
pub(crate) fn morlet_spectrum(bandwidth: f64, center_frequency: f64, omega: f64) -> f64 {
    let (_, kappa) = morlet_constants(bandwidth, center_frequency);
    let w0 = 2.0 * PI * center_frequency;
    let quarter = bandwidth / 4.0;
    0.5 * (-quarter * (omega - w0).powi(2)).exp() + 0.5 * (-quarter * (omega + w0).powi(2)).exp()
        - kappa * (-quarter * omega * omega).exp()
}
