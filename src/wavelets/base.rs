// src/wavelets/base.rs
use std::fmt;

/// Wavelet families recognised by name.
///
/// Matching is a case-insensitive substring search, so `"Morlet (fb=1)"`,
/// `"cmor1.5-1.0"` and `"MORLET"` all map to [`WaveletFamily::Morlet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveletFamily {
    Morlet,
    /// Derivative of Gaussian of the given order (`mexh` is order 2).
    Dog(u32),
    Paul(u32),
    Shannon,
    Unknown,
}

impl WaveletFamily {
    /// Default order when a `dog` name carries no digits.
    pub const DEFAULT_DOG_ORDER: u32 = 2;
    /// Default order when a `paul` name carries no digits.
    pub const DEFAULT_PAUL_ORDER: u32 = 4;

    /// Classifies a wavelet by its name.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("morlet") || lower.contains("cmor") {
            WaveletFamily::Morlet
        } else if lower.contains("mexh") {
            WaveletFamily::Dog(2)
        } else if let Some(pos) = lower.find("dog") {
            WaveletFamily::Dog(order_after(&lower[pos + 3..]).unwrap_or(Self::DEFAULT_DOG_ORDER))
        } else if let Some(pos) = lower.find("paul") {
            WaveletFamily::Paul(order_after(&lower[pos + 4..]).unwrap_or(Self::DEFAULT_PAUL_ORDER))
        } else if lower.contains("shannon") || lower.contains("shan") {
            WaveletFamily::Shannon
        } else {
            WaveletFamily::Unknown
        }
    }

    /// Multiplier applied to the Nyquist-bound minimum scale.
    ///
    /// Broad-band families alias earlier and get a wider margin; Shannon has
    /// a sharp band edge and can go lower.
    pub fn min_scale_factor(self) -> f64 {
        match self {
            WaveletFamily::Morlet => 1.0,
            WaveletFamily::Dog(_) => 1.25,
            WaveletFamily::Paul(_) => 1.1,
            WaveletFamily::Shannon => 0.8,
            WaveletFamily::Unknown => 1.0,
        }
    }
}

fn order_after(rest: &str) -> Option<u32> {
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|&order| order > 0)
}

/// Imaginary component of a complex mother wavelet.
pub trait ComplexWavelet: Send + Sync {
    /// Imaginary part of `psi(t)`.
    fn psi_imaginary(&self, t: f64) -> f64;
}

/// A mother wavelet evaluated in the time domain.
///
/// Implementations are immutable once constructed; the transforms share them
/// across threads behind an `Arc`.
pub trait ContinuousWavelet: Send + Sync {
    /// Short identifier used for family matching.
    fn name(&self) -> String;

    /// Real part of the mother wavelet at `t`.
    fn psi(&self, t: f64) -> f64;

    /// Centre frequency in cycles per unit `t` (strictly positive).
    fn center_frequency(&self) -> f64;

    /// Effective time-domain half-width divided by four (strictly positive).
    /// The sampled support at scale `s` spans `8·s·bandwidth` samples.
    fn bandwidth(&self) -> f64;

    /// The imaginary component, for complex wavelets.
    fn complex_part(&self) -> Option<&dyn ComplexWavelet> {
        None
    }

    fn is_complex(&self) -> bool {
        self.complex_part().is_some()
    }

    /// Imaginary part of `psi(t)`; identically zero for real wavelets.
    fn psi_imaginary(&self, t: f64) -> f64 {
        self.complex_part().map_or(0.0, |c| c.psi_imaginary(t))
    }

    fn family(&self) -> WaveletFamily {
        WaveletFamily::from_name(&self.name())
    }

    /// `n` samples of the real part over `[-4·bandwidth, 4·bandwidth]`,
    /// scaled to unit energy.
    fn discretize(&self, n: usize) -> Vec<f64> {
        if n == 0 {
            return Vec::new();
        }
        let half = 4.0 * self.bandwidth();
        let step = if n > 1 { 2.0 * half / (n - 1) as f64 } else { 0.0 };
        let start = if n > 1 { -half } else { 0.0 };

        let mut samples: Vec<f64> = (0..n).map(|i| self.psi(start + i as f64 * step)).collect();
        let energy = samples.iter().map(|v| v * v).sum::<f64>().sqrt();
        if energy > 1e-10 {
            samples.iter_mut().for_each(|v| *v /= energy);
        }
        samples
    }
}

impl fmt::Debug for dyn ContinuousWavelet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuousWavelet")
            .field("name", &self.name())
            .field("center_frequency", &self.center_frequency())
            .field("bandwidth", &self.bandwidth())
            .field("complex", &self.is_complex())
            .finish()
    }
}
