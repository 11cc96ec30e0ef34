// src/scales/range.rs
//! Scale range bounds, critical sampling and scale/frequency conversion.

use log::debug;

use super::config::ScaleSelectionConfig;
use crate::error::{ensure_positive, validate_scales, CwtError, Result};
use crate::wavelets::ContinuousWavelet;

/// Inclusive `[min, max]` scale interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl ScaleRange {
    /// Range width in octaves.
    pub fn octaves(&self) -> f64 {
        (self.max / self.min).log2()
    }
}

/// `f = fc · fs / s`
pub fn scale_to_frequency(scale: f64, wavelet: &dyn ContinuousWavelet, sampling_rate: f64) -> f64 {
    wavelet.center_frequency() * sampling_rate / scale
}

/// `s = fc · fs / f`
pub fn frequency_to_scale(frequency: f64, wavelet: &dyn ContinuousWavelet, sampling_rate: f64) -> f64 {
    wavelet.center_frequency() * sampling_rate / frequency
}

/// `(f_min, f_max)` covered by `scales`.
pub fn frequency_range(
    scales: &[f64],
    wavelet: &dyn ContinuousWavelet,
    sampling_rate: f64,
) -> Result<(f64, f64)> {
    validate_scales(scales)?;
    ensure_positive("sampling rate", sampling_rate)?;
    let min_scale = scales.iter().copied().fold(f64::INFINITY, f64::min);
    let max_scale = scales.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok((
        scale_to_frequency(max_scale, wavelet, sampling_rate),
        scale_to_frequency(min_scale, wavelet, sampling_rate),
    ))
}

/// Smallest useful scale: the Nyquist bound `2·fc` widened by a
/// bandwidth-dependent margin and a per-family factor.
pub fn minimum_scale(wavelet: &dyn ContinuousWavelet) -> f64 {
    let fc = wavelet.center_frequency();
    let margin = 1.0 + 0.1 * (wavelet.bandwidth() / fc).min(5.0);
    2.0 * fc * margin * wavelet.family().min_scale_factor()
}

/// Largest useful scale for `len` samples: the sampled support must fit in
/// twice the signal and the centre frequency must complete two cycles.
pub fn maximum_scale(wavelet: &dyn ContinuousWavelet, len: usize) -> f64 {
    let n = len as f64;
    let duration_bound = n / (4.0 * wavelet.bandwidth());
    let frequency_bound = wavelet.center_frequency() * n / 2.0;
    duration_bound.min(frequency_bound)
}

/// Scale interval for a signal of `len` samples. An explicit frequency range
/// in the config takes precedence.
pub fn scale_range(
    wavelet: &dyn ContinuousWavelet,
    len: usize,
    config: &ScaleSelectionConfig,
) -> Result<ScaleRange> {
    if let Some((min_freq, max_freq)) = config.frequency_range() {
        let fs = config.sampling_rate();
        return Ok(ScaleRange {
            min: frequency_to_scale(max_freq, wavelet, fs),
            max: frequency_to_scale(min_freq, wavelet, fs),
        });
    }
    if len == 0 {
        return Err(CwtError::EmptyInput("signal"));
    }

    let min = minimum_scale(wavelet);
    let mut max = maximum_scale(wavelet, len);
    if max <= min {
        debug!("signal of {len} samples too short for scale range; using one octave from {min}");
        max = 2.0 * min;
    }
    Ok(ScaleRange { min, max })
}

/// Q-dependent ceiling on the critical-sampling ratio.
pub fn ratio_cap(q: f64) -> f64 {
    if q >= 5.0 {
        2.0
    } else if q >= 2.0 {
        2.5
    } else if q >= 1.0 {
        3.5
    } else {
        5.0
    }
}

/// Ratio between consecutive scales derived from `Q = fc / bandwidth`:
/// `1 + 2/Q`, capped by [`ratio_cap`], at least 1.01.
pub fn critical_ratio(wavelet: &dyn ContinuousWavelet) -> f64 {
    let q = wavelet.center_frequency() / wavelet.bandwidth();
    (1.0 + 2.0 / q).min(ratio_cap(q)).max(1.01)
}

/// Number of geometric scales covering `range`, at most `max_scales`.
pub fn scale_count(
    range: ScaleRange,
    wavelet: &dyn ContinuousWavelet,
    config: &ScaleSelectionConfig,
) -> usize {
    let span = (range.max / range.min).ln();
    let count = if config.critical_sampling() {
        (span / critical_ratio(wavelet).ln()).ceil() as usize + 1
    } else {
        (range.octaves() * config.voices_per_octave() as f64).ceil() as usize + 1
    };
    count.clamp(2, config.max_scales())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelets::{DerivativeOfGaussian, Morlet, Shannon};
    use approx::assert_relative_eq;

    #[test]
    fn test_minimum_scale() {
        // Morlet fc=1, bw=1: 2·1·(1 + 0.1)·1
        assert_relative_eq!(minimum_scale(&Morlet::default()), 2.2, epsilon = 1e-12);
        // Margin saturates at 5 for very broad wavelets
        let mexh = DerivativeOfGaussian::mexican_hat();
        let fc = mexh.center_frequency();
        assert_relative_eq!(minimum_scale(&mexh), 2.0 * fc * 1.5 * 1.25, epsilon = 1e-12);
        let shannon = Shannon::new(1.0, 1.5).unwrap();
        assert!(minimum_scale(&shannon) < 2.0 * 1.5 * 1.1);
    }

    #[test]
    fn test_maximum_scale() {
        let morlet = Morlet::default();
        assert_eq!(maximum_scale(&morlet, 2048), 512.0);
        let narrow = Morlet::new(1.0, 0.1).unwrap();
        assert_relative_eq!(maximum_scale(&narrow, 2048), 102.4, epsilon = 1e-9);
    }

    #[test]
    fn test_short_signal_gets_one_octave() {
        let range = scale_range(&Morlet::default(), 4, &ScaleSelectionConfig::new()).unwrap();
        assert_relative_eq!(range.max, 2.0 * range.min);
    }

    #[test]
    fn test_frequency_range_overrides() {
        let config = ScaleSelectionConfig::new()
            .with_sampling_rate(1000.0)
            .with_frequency_range(10.0, 100.0);
        let range = scale_range(&Morlet::default(), 10, &config).unwrap();
        assert_relative_eq!(range.min, 10.0);
        assert_relative_eq!(range.max, 100.0);
    }

    #[test]
    fn test_critical_ratio_caps() {
        assert_eq!(ratio_cap(10.0), 2.0);
        assert_eq!(ratio_cap(3.0), 2.5);
        assert_eq!(ratio_cap(1.0), 3.5);
        assert_eq!(ratio_cap(0.2), 5.0);
        // Q = 1: 1 + 2 = 3 below the 3.5 cap
        assert_relative_eq!(critical_ratio(&Morlet::default()), 3.0);
        // Q = 10: 1.2
        assert_relative_eq!(critical_ratio(&Morlet::new(0.1, 1.0).unwrap()), 1.2, epsilon = 1e-12);
        // Q = 0.1: 21 capped to 5
        assert_eq!(critical_ratio(&Morlet::new(10.0, 1.0).unwrap()), 5.0);
    }

    #[test]
    fn test_scale_count() {
        let morlet = Morlet::default();
        let range = ScaleRange { min: 1.0, max: 16.0 };
        let config = ScaleSelectionConfig::new().with_voices_per_octave(4);
        assert_eq!(scale_count(range, &morlet, &config), 17);
        let capped = config.with_max_scales(10);
        assert_eq!(scale_count(range, &morlet, &capped), 10);
    }

    #[test]
    fn test_frequency_range_of_scales() {
        let (lo, hi) = frequency_range(&[2.0, 4.0, 8.0], &Morlet::default(), 16.0).unwrap();
        assert_eq!((lo, hi), (2.0, 8.0));
        assert!(frequency_range(&[], &Morlet::default(), 16.0).is_err());
    }
}
