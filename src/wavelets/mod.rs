// src/wavelets/mod.rs
//! Mother wavelets consumed by the transforms.
//!
//! The engine only relies on the [`ContinuousWavelet`] contract; the
//! families here are the ones the admissibility table and the discrete
//! filter matcher know by name.

pub mod base;
pub mod dog;
pub mod morlet;
pub mod paul;
pub mod shannon;

use std::sync::Arc;

pub use base::{ComplexWavelet, ContinuousWavelet, WaveletFamily};
pub use dog::DerivativeOfGaussian;
pub use morlet::{ComplexMorlet, Morlet};
pub use paul::Paul;
pub use shannon::Shannon;

use crate::error::{CwtError, Result};

/// Builds a wavelet from a short identifier.
///
/// Accepted forms: `morlet`, `morlet{fb}-{fc}`, `cmor{fb}-{fc}`, `mexh`,
/// `dog{m}`, `paul{m}`, `shannon{fb}-{fc}` (also `shan{fb}-{fc}`).
pub fn wavelet_from_name(name: &str) -> Result<Arc<dyn ContinuousWavelet>> {
    let lower = name.trim().to_ascii_lowercase();

    if let Some(params) = lower.strip_prefix("cmor") {
        let (fb, fc) = parse_pair(params, (1.0, 1.0))?;
        return Ok(Arc::new(ComplexMorlet::new(fb, fc)?));
    }
    if let Some(params) = lower.strip_prefix("morlet") {
        let (fb, fc) = parse_pair(params, (1.0, 1.0))?;
        return Ok(Arc::new(Morlet::new(fb, fc)?));
    }
    if let Some(params) = lower
        .strip_prefix("shannon")
        .or_else(|| lower.strip_prefix("shan"))
    {
        let (fb, fc) = parse_pair(params, (1.0, 1.5))?;
        return Ok(Arc::new(Shannon::new(fb, fc)?));
    }

    match WaveletFamily::from_name(&lower) {
        WaveletFamily::Dog(order) => Ok(Arc::new(DerivativeOfGaussian::new(order)?)),
        WaveletFamily::Paul(order) => Ok(Arc::new(Paul::new(order)?)),
        _ => Err(CwtError::InvalidParameter(format!("unknown wavelet: {name}"))),
    }
}

fn parse_pair(params: &str, default: (f64, f64)) -> Result<(f64, f64)> {
    if params.is_empty() {
        return Ok(default);
    }
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| CwtError::InvalidParameter(format!("cannot parse wavelet parameter {s:?}")))
    };
    match params.split_once('-') {
        Some((fb, fc)) => Ok((parse(fb)?, parse(fc)?)),
        None => Err(CwtError::InvalidParameter(format!(
            "expected parameters as {{bandwidth}}-{{center}}, got {params:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wavelet_from_name() {
        let w = wavelet_from_name("cmor1.5-1.0").unwrap();
        assert!(w.is_complex());
        assert_eq!(w.bandwidth(), 1.5);
        assert_eq!(w.center_frequency(), 1.0);

        let w = wavelet_from_name("Morlet").unwrap();
        assert!(!w.is_complex());
        assert_eq!(w.family(), WaveletFamily::Morlet);

        assert_eq!(wavelet_from_name("mexh").unwrap().name(), "mexh");
        assert_eq!(wavelet_from_name("dog3").unwrap().name(), "dog3");
        assert!(wavelet_from_name("paul2").unwrap().is_complex());
        assert_eq!(wavelet_from_name("shan2-3").unwrap().bandwidth(), 2.0);
    }

    #[test]
    fn test_wavelet_from_name_errors() {
        assert!(wavelet_from_name("unknown").is_err());
        assert!(wavelet_from_name("cmor1.5").is_err());
        assert!(wavelet_from_name("morlet0-1").is_err());
    }
}
