// src/scales/adaptive.rs
//! Signal-adaptive scale selection driven by spectral peaks.

use log::{debug, warn};
use ndarray::{s, Array1};
use ndarray_stats::QuantileExt;
use std::f64::consts::PI;

use super::config::ScaleSelectionConfig;
use super::range::{scale_count, ScaleRange};
use super::spacing::{logarithmic_scales, sort_dedup};
use crate::error::Result;
use crate::spectral::fft::SpectralKernel;
use crate::utils::array::next_power_of_2;
use crate::wavelets::ContinuousWavelet;

/// Relative tolerance under which merged scales count as duplicates.
pub const DEDUP_TOLERANCE: f64 = 1e-3;
/// Width (in natural-log scale units) of the Gaussian used to rank scales
/// when the merged grid is too long.
const PRIORITY_WIDTH: f64 = 0.5;
/// Extra scales are placed within this many octaves of a peak's scale.
const DENSIFY_HALF_OCTAVES: f64 = 0.5;

/// A dominant spectral component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    pub frequency: f64,
    pub power: f64,
    /// Fraction of the kept peaks' total power.
    pub share: f64,
}

/// Hann-windowed one-sided power spectrum, zero-padded to a power of two.
/// Returns `(frequencies, power)` including the DC bin.
pub fn windowed_power_spectrum(
    signal: &[f64],
    sampling_rate: f64,
    kernel: &SpectralKernel,
) -> Result<(Vec<f64>, Array1<f64>)> {
    let n = signal.len();
    let n_fft = next_power_of_2(n.max(2));

    let mut buffer = vec![0.0; n_fft];
    for (i, (slot, &x)) in buffer.iter_mut().zip(signal).enumerate() {
        let window = if n > 1 {
            0.5 * (1.0 - (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        } else {
            1.0
        };
        *slot = x * window;
    }

    let spectrum = kernel.real_spectrum(&buffer)?;
    let power: Array1<f64> = spectrum.iter().map(|c| c.norm_sqr()).collect();
    let frequencies = (0..power.len())
        .map(|k| k as f64 * sampling_rate / n_fft as f64)
        .collect();
    Ok((frequencies, power))
}

/// Local maxima above `threshold × max power` (DC excluded), strongest
/// first, kept until they explain `coverage` of the total non-DC power.
/// When the peaks cannot reach that share, all of them are kept.
pub fn detect_peaks(
    frequencies: &[f64],
    power: &Array1<f64>,
    threshold: f64,
    coverage: f64,
) -> Vec<SpectralPeak> {
    if power.len() < 2 {
        return Vec::new();
    }
    let max_power = match power.slice(s![1..]).max() {
        Ok(&max) if max > 1e-20 => max,
        _ => return Vec::new(),
    };
    let floor = threshold * max_power;
    let last = power.len() - 1;

    let mut candidates: Vec<(f64, f64)> = (1..=last)
        .filter(|&k| {
            let p = power[k];
            let rising = k == 1 || p > power[k - 1];
            let falling = k == last || p >= power[k + 1];
            p >= floor && rising && falling
        })
        .map(|k| (frequencies[k], power[k]))
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.total_cmp(&b.0)));

    let total = power.slice(s![1..]).sum();
    let mut kept = Vec::new();
    let mut explained = 0.0;
    for (frequency, p) in candidates {
        if explained >= coverage * total {
            break;
        }
        explained += p;
        kept.push((frequency, p));
    }

    kept.into_iter()
        .map(|(frequency, p)| SpectralPeak {
            frequency,
            power: p,
            share: p / explained,
        })
        .collect()
}

/// Scales densified around the dominant peaks of `signal`.
///
/// A logarithmic base grid over `range` is merged with extra scales within
/// half an octave of each peak's scale (more for stronger peaks). When the
/// merged grid exceeds the maximum count, scales far from strong peaks are
/// dropped first; the range endpoints are always kept.
pub fn adaptive_scales(
    signal: &[f64],
    wavelet: &dyn ContinuousWavelet,
    config: &ScaleSelectionConfig,
    range: ScaleRange,
    kernel: &SpectralKernel,
) -> Result<Vec<f64>> {
    let fs = config.sampling_rate();
    let base = logarithmic_scales(range, scale_count(range, wavelet, config));

    let (frequencies, power) = windowed_power_spectrum(signal, fs, kernel)?;
    let peaks = detect_peaks(
        &frequencies,
        &power,
        config.peak_threshold(),
        config.energy_coverage(),
    );

    // (scale, share) for peaks inside the analysed range
    let anchors: Vec<(f64, f64)> = peaks
        .iter()
        .map(|p| (wavelet.center_frequency() * fs / p.frequency, p.share))
        .filter(|(scale, _)| *scale >= range.min && *scale <= range.max)
        .collect();
    if anchors.is_empty() {
        debug!("no spectral peaks inside the scale range; using the logarithmic grid");
        return Ok(base);
    }

    let mut scales = base;
    let density = 2.0 * config.voices_per_octave() as f64;
    for &(anchor, share) in &anchors {
        let extra = (share * density).ceil().max(1.0) as usize;
        for i in 0..extra {
            let offset = if extra > 1 {
                -DENSIFY_HALF_OCTAVES + 2.0 * DENSIFY_HALF_OCTAVES * i as f64 / (extra - 1) as f64
            } else {
                0.0
            };
            let scale = anchor * 2f64.powf(offset);
            if scale >= range.min && scale <= range.max {
                scales.push(scale);
            }
        }
    }
    sort_dedup(&mut scales, DEDUP_TOLERANCE);
    debug!("adaptive grid: {} scales around {} peaks", scales.len(), anchors.len());

    if scales.len() > config.max_scales() {
        warn!(
            "adaptive grid has {} scales, dropping to {} by peak proximity",
            scales.len(),
            config.max_scales()
        );
        scales = reduce_by_priority(&scales, &anchors, config.max_scales());
    }
    Ok(scales)
}

/// Keeps the `max` highest-priority scales (ascending order preserved).
/// Priority is the largest `share · exp(-ln(s/anchor)² / (2·0.5²))` over the
/// anchors; the first and last scale always survive.
pub fn reduce_by_priority(scales: &[f64], anchors: &[(f64, f64)], max: usize) -> Vec<f64> {
    if scales.len() <= max {
        return scales.to_vec();
    }
    let last = scales.len() - 1;
    let priority = |i: usize| -> f64 {
        if i == 0 || i == last {
            return f64::INFINITY;
        }
        anchors
            .iter()
            .map(|&(anchor, share)| {
                let d = (scales[i] / anchor).ln();
                share * (-d * d / (2.0 * PRIORITY_WIDTH * PRIORITY_WIDTH)).exp()
            })
            .fold(0.0, f64::max)
    };

    let mut order: Vec<(usize, f64)> = (0..scales.len()).map(|i| (i, priority(i))).collect();
    // Stable sort keeps lower indices first among equal priorities
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut keep: Vec<usize> = order.into_iter().take(max).map(|(i, _)| i).collect();
    keep.sort_unstable();
    keep.into_iter().map(|i| scales[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scales::range::scale_range;
    use crate::wavelets::Morlet;

    fn two_tones(n: usize, fs: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / fs;
                (2.0 * PI * 50.0 * t).sin() + (2.0 * PI * 120.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_detects_both_tones() {
        let kernel = SpectralKernel::new();
        let (freqs, power) = windowed_power_spectrum(&two_tones(1024, 1000.0), 1000.0, &kernel).unwrap();
        let peaks = detect_peaks(&freqs, &power, 0.02, 0.9);
        assert_eq!(peaks.len(), 2);
        let mut found: Vec<f64> = peaks.iter().map(|p| p.frequency).collect();
        found.sort_by(f64::total_cmp);
        assert!((found[0] - 50.0).abs() < 2.0);
        assert!((found[1] - 120.0).abs() < 2.0);
        let share: f64 = peaks.iter().map(|p| p.share).sum();
        assert!((share - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_coverage_counts_the_whole_spectrum() {
        // Peaks of 10, 6 and 4 over small bumps below the threshold; 25 in all
        // without the DC bin
        let power = Array1::from(vec![
            50.0, 0.0, 10.0, 0.0, 6.0, 0.0, 4.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0,
        ]);
        let freqs: Vec<f64> = (0..power.len()).map(|k| k as f64).collect();

        let peaks = detect_peaks(&freqs, &power, 0.2, 0.6);
        assert_eq!(peaks.iter().map(|p| p.frequency).collect::<Vec<_>>(), vec![2.0, 4.0]);
        // 16 of 25 falls short of 70%, so the third peak joins
        let peaks = detect_peaks(&freqs, &power, 0.2, 0.7);
        assert_eq!(peaks.iter().map(|p| p.frequency).collect::<Vec<_>>(), vec![2.0, 4.0, 6.0]);
        assert!((peaks[0].share - 0.5).abs() < 1e-12);
        // Unreachable coverage keeps every detected peak
        assert_eq!(detect_peaks(&freqs, &power, 0.2, 1.0).len(), 3);
    }

    #[test]
    fn test_silent_signal_has_no_peaks() {
        let kernel = SpectralKernel::new();
        let (freqs, power) = windowed_power_spectrum(&[0.0; 300], 1.0, &kernel).unwrap();
        assert!(detect_peaks(&freqs, &power, 0.02, 0.9).is_empty());
    }

    #[test]
    fn test_densifies_near_peaks() {
        let kernel = SpectralKernel::new();
        let fs = 1000.0;
        let signal = two_tones(1024, fs);
        let wavelet = Morlet::default();
        let config = ScaleSelectionConfig::new().with_sampling_rate(fs);
        let range = scale_range(&wavelet, signal.len(), &config).unwrap();
        let base = logarithmic_scales(range, scale_count(range, &wavelet, &config));

        let scales = adaptive_scales(&signal, &wavelet, &config, range, &kernel).unwrap();
        assert!(scales.len() > base.len());
        assert!(scales.windows(2).all(|w| w[0] < w[1]));

        // 50 Hz -> scale 20, 120 Hz -> scale 8.33
        for target in [20.0, 1000.0 / 120.0] {
            let near = |grid: &[f64]| grid.iter().filter(|&&s| (s / target).ln().abs() < 0.35).count();
            assert!(near(&scales) > near(&base));
        }
    }

    #[test]
    fn test_reduction_keeps_endpoints_and_peak_neighbourhood() {
        let scales: Vec<f64> = (0..20).map(|i| 2f64.powf(i as f64 / 2.0)).collect();
        let anchors = [(8.0, 1.0)];
        let reduced = reduce_by_priority(&scales, &anchors, 5);
        assert_eq!(reduced.len(), 5);
        assert_eq!(reduced[0], scales[0]);
        assert_eq!(reduced[4], scales[19]);
        assert!(reduced.iter().any(|&s| (s - 8.0).abs() < 1e-9));
        assert!(reduced.windows(2).all(|w| w[0] < w[1]));
    }
}
