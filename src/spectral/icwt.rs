// src/spectral/icwt.rs
//! Inverse continuous wavelet transform.
//!
//! Reconstruction integrates every row against the (real) wavelet:
//!
//! ```text
//! x(t) = 1/C · Σ_s (w_s / s) · Σ_b W(s, b) · ψ((t - b)/s) / √s
//! ```
//!
//! where `w_s` are log-scale quadrature weights and `C` the admissibility
//! constant. Coefficients are expected from a scale-normalised forward
//! transform.

use std::sync::Arc;

use log::{debug, trace};
use ndarray::{ArrayView1, ArrayView2};
use num_complex::Complex64;
use num_traits::Zero;
use rayon::prelude::*;

use crate::config::InverseConfig;
use crate::error::{ensure_positive, CwtError, Result};
use crate::spectral::admissibility::admissibility_constant;
use crate::spectral::cwt::{sample_wavelet, support_length};
use crate::spectral::fft::SpectralKernel;
use crate::spectral::result::CwtResult;
use crate::utils::array::next_power_of_2;
use crate::utils::simd;
use crate::wavelets::ContinuousWavelet;

/// Quadrature weights for integrating over `ln s`.
///
/// Central differences of `ln s` for interior scales, half intervals at the
/// ends; a single scale gets weight 1.
pub fn log_scale_weights(scales: &[f64]) -> Vec<f64> {
    let n = scales.len();
    if n <= 1 {
        return vec![1.0; n];
    }
    let logs: Vec<f64> = scales.iter().map(|s| s.ln()).collect();
    (0..n)
        .map(|i| {
            let lo = logs[i.saturating_sub(1)];
            let hi = logs[(i + 1).min(n - 1)];
            ((hi - lo) / 2.0).abs()
        })
        .collect()
}

/// Reconstructs signals from CWT coefficients.
#[derive(Debug, Clone)]
pub struct InverseCwt {
    wavelet: Arc<dyn ContinuousWavelet>,
    config: InverseConfig,
    constant: f64,
    kernel: SpectralKernel,
}

impl InverseCwt {
    pub fn new(wavelet: Arc<dyn ContinuousWavelet>) -> Result<Self> {
        Self::with_config(wavelet, InverseConfig::default())
    }

    /// # Errors
    /// [`CwtError::Inadmissible`] if the wavelet's admissibility constant is
    /// not positive and finite.
    pub fn with_config(wavelet: Arc<dyn ContinuousWavelet>, config: InverseConfig) -> Result<Self> {
        config.validate()?;
        ensure_positive("wavelet bandwidth", wavelet.bandwidth())?;
        let constant = admissibility_constant(wavelet.as_ref())?;
        debug!("inverse CWT for {}: C = {constant:.6}", wavelet.name());
        Ok(InverseCwt {
            wavelet,
            config,
            constant,
            kernel: SpectralKernel::new(),
        })
    }

    /// Shares an FFT plan cache with other components.
    pub fn with_spectral_kernel(mut self, kernel: SpectralKernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn wavelet(&self) -> &Arc<dyn ContinuousWavelet> {
        &self.wavelet
    }

    pub fn config(&self) -> &InverseConfig {
        &self.config
    }

    pub fn admissibility_constant(&self) -> f64 {
        self.constant
    }

    /// Reconstructs a real-valued result, picking direct or FFT integration
    /// by signal length.
    ///
    /// # Errors
    /// [`CwtError::Unsupported`] for complex results; use
    /// [`reconstruct_real_part`](Self::reconstruct_real_part).
    pub fn reconstruct(&self, result: &CwtResult) -> Result<Vec<f64>> {
        self.ensure_real(result)?;
        self.reconstruct_real_part(result)
    }

    /// Reconstructs from the real part of the coefficients against the real
    /// part of the wavelet. Works for real and complex results.
    pub fn reconstruct_real_part(&self, result: &CwtResult) -> Result<Vec<f64>> {
        let all: Vec<usize> = (0..result.num_scales()).collect();
        self.synthesize(result, &all, self.use_fft(result.num_samples()))
    }

    /// Time-domain integration regardless of size.
    pub fn reconstruct_direct(&self, result: &CwtResult) -> Result<Vec<f64>> {
        self.ensure_real(result)?;
        let all: Vec<usize> = (0..result.num_scales()).collect();
        self.synthesize(result, &all, false)
    }

    /// Spectral integration regardless of size.
    pub fn reconstruct_fft(&self, result: &CwtResult) -> Result<Vec<f64>> {
        self.ensure_real(result)?;
        let all: Vec<usize> = (0..result.num_scales()).collect();
        self.synthesize(result, &all, true)
    }

    /// Reconstructs from the scales in `[min_scale, max_scale]` only.
    ///
    /// Weights come from the full scale array, so reconstructions of
    /// disjoint bands add up to [`reconstruct`](Self::reconstruct). A band
    /// containing no scale yields zeros.
    pub fn reconstruct_band(&self, result: &CwtResult, min_scale: f64, max_scale: f64) -> Result<Vec<f64>> {
        self.ensure_real(result)?;
        let rows = band_rows(result.scales_slice(), min_scale, max_scale)?;
        debug!("band [{min_scale}, {max_scale}]: {} of {} scales", rows.len(), result.num_scales());
        self.synthesize(result, &rows, self.use_fft(result.num_samples()))
    }

    /// Band reconstruction addressed in Hz: `s = fc · fs / f`.
    pub fn reconstruct_frequency_band(
        &self,
        result: &CwtResult,
        min_frequency: f64,
        max_frequency: f64,
        sampling_rate: f64,
    ) -> Result<Vec<f64>> {
        let (min_scale, max_scale) = self.frequency_band_scales(min_frequency, max_frequency, sampling_rate)?;
        self.reconstruct_band(result, min_scale, max_scale)
    }

    /// Scale interval `[fc·fs/f_max, fc·fs/f_min]` of a frequency band.
    pub(crate) fn frequency_band_scales(
        &self,
        min_frequency: f64,
        max_frequency: f64,
        sampling_rate: f64,
    ) -> Result<(f64, f64)> {
        ensure_positive("sampling rate", sampling_rate)?;
        ensure_positive("minimum frequency", min_frequency)?;
        ensure_positive("maximum frequency", max_frequency)?;
        if min_frequency > max_frequency {
            return Err(CwtError::InvalidRange {
                min: min_frequency,
                max: max_frequency,
            });
        }
        let fc = self.wavelet.center_frequency();
        Ok((fc * sampling_rate / max_frequency, fc * sampling_rate / min_frequency))
    }

    fn ensure_real(&self, result: &CwtResult) -> Result<()> {
        if result.is_complex() {
            Err(CwtError::Unsupported(
                "complex coefficients; reconstruct the real part instead".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn use_fft(&self, len: usize) -> bool {
        len >= self.config.fft_threshold()
    }

    /// Scale factor `w_s / (s·√s·C)` of every row.
    pub(crate) fn row_factors(&self, scales: &[f64]) -> Vec<f64> {
        log_scale_weights(scales)
            .into_iter()
            .zip(scales)
            .map(|(w, &s)| w / (s * s.sqrt() * self.constant))
            .collect()
    }

    fn synthesize(&self, result: &CwtResult, rows: &[usize], fft: bool) -> Result<Vec<f64>> {
        let n = result.num_samples();
        if rows.is_empty() {
            return Ok(vec![0.0; n]);
        }
        let coefficients = result.real_view();
        let factors = self.row_factors(result.scales_slice());
        let scales = result.scales_slice();
        trace!("synthesizing {} rows, n={n}, fft={fft}", rows.len());

        if fft {
            self.synthesize_fft(coefficients, scales, &factors, rows)
        } else {
            let contributions = self.map_rows(rows, |row| {
                let mut out = self.scale_contribution(coefficients.row(row), scales[row], n)?;
                out.iter_mut().for_each(|v| *v *= factors[row]);
                Ok(out)
            })?;
            Ok(sum_rows(contributions, n))
        }
    }

    /// Unweighted `Σ_b W(b)·ψ((t-b)/s)` restricted to the wavelet support,
    /// skipping coefficients at or below the tolerance.
    pub(crate) fn scale_contribution(&self, row: ArrayView1<'_, f64>, scale: f64, n: usize) -> Result<Vec<f64>> {
        let mut out = vec![0.0; n];
        let taps = sample_wavelet(self.wavelet.as_ref(), scale)?;
        let half = taps.len() / 2;
        let tolerance = self.config.tolerance();

        for (b, &coefficient) in row.iter().enumerate() {
            if coefficient.abs() <= tolerance {
                continue;
            }
            // t = b + j - half must stay inside [0, n)
            let first = half.saturating_sub(b);
            let last = (n + half - b).min(taps.len());
            if first >= last {
                continue;
            }
            let start = b + first - half;
            simd::axpy(&mut out[start..start + (last - first)], coefficient, &taps[first..last]);
        }
        Ok(out)
    }

    /// Half spectrum of the wavelet taps at `scale`, laid out circularly on
    /// `m` points with the centre tap at index 0.
    pub(crate) fn taps_spectrum(&self, scale: f64, m: usize) -> Result<Vec<Complex64>> {
        let half = (support_length(scale, self.wavelet.bandwidth())? / 2) as isize;
        let mut taps = vec![0.0; m];
        for j in -half..=half {
            taps[j.rem_euclid(m as isize) as usize] += self.wavelet.psi(j as f64 / scale);
        }
        self.kernel.real_spectrum(&taps)
    }

    pub(crate) fn spectral_kernel(&self) -> &SpectralKernel {
        &self.kernel
    }

    /// Linear convolution per row via one shared FFT length
    /// `next_pow2(N + h_max + 1)`; spectra are accumulated and inverted once.
    fn synthesize_fft(
        &self,
        coefficients: ArrayView2<'_, f64>,
        scales: &[f64],
        factors: &[f64],
        rows: &[usize],
    ) -> Result<Vec<f64>> {
        let n = coefficients.ncols();
        let bandwidth = self.wavelet.bandwidth();
        let mut half_max = 0;
        for &row in rows {
            half_max = half_max.max(support_length(scales[row], bandwidth)? / 2);
        }
        let m = next_power_of_2(n + half_max + 1);

        let spectra = self.map_rows(rows, |row| {
            let scale = scales[row];
            let mut buffer = vec![0.0; m];
            buffer[..n]
                .iter_mut()
                .zip(coefficients.row(row).iter())
                .for_each(|(dst, &w)| *dst = w * factors[row]);
            let mut spectrum = self.kernel.real_spectrum(&buffer)?;
            let taps_spectrum = self.taps_spectrum(scale, m)?;
            spectrum
                .iter_mut()
                .zip(&taps_spectrum)
                .for_each(|(a, b)| *a *= b);
            Ok(spectrum)
        })?;

        // Sequential sum keeps the result independent of thread scheduling
        let mut total = vec![Complex64::zero(); m / 2 + 1];
        for spectrum in spectra {
            total.iter_mut().zip(&spectrum).for_each(|(acc, s)| *acc += s);
        }
        let mut signal = self.kernel.real_inverse(total, m)?;
        signal.truncate(n);
        Ok(signal)
    }

    pub(crate) fn map_rows<T, F>(&self, rows: &[usize], f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        if rows.len() >= self.config.parallel_threshold() {
            rows.par_iter().map(|&r| f(r)).collect()
        } else {
            rows.iter().map(|&r| f(r)).collect()
        }
    }
}

/// Rows whose scale lies in `[min_scale, max_scale]`.
///
/// Both bounds must be positive and finite, and `min_scale ≤ max_scale`.
pub(crate) fn band_rows(scales: &[f64], min_scale: f64, max_scale: f64) -> Result<Vec<usize>> {
    ensure_positive("min_scale", min_scale)?;
    ensure_positive("max_scale", max_scale)?;
    if min_scale > max_scale {
        return Err(CwtError::InvalidRange {
            min: min_scale,
            max: max_scale,
        });
    }
    Ok(scales
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s >= min_scale && s <= max_scale)
        .map(|(i, _)| i)
        .collect())
}

/// Adds rows in order.
pub(crate) fn sum_rows(rows: Vec<Vec<f64>>, n: usize) -> Vec<f64> {
    let mut total = vec![0.0; n];
    for row in rows {
        simd::axpy(&mut total, 1.0, &row);
    }
    total
}

/// One-shot reconstruction with the default configuration.
pub fn icwt(result: &CwtResult, wavelet: Arc<dyn ContinuousWavelet>) -> Result<Vec<f64>> {
    InverseCwt::new(wavelet)?.reconstruct(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CwtConfig;
    use crate::spectral::cwt::CwtTransform;
    use crate::wavelets::{ComplexMorlet, Morlet, Shannon};
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn log_scales(min: f64, max: f64, count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| (min.ln() + i as f64 * (max.ln() - min.ln()) / (count - 1) as f64).exp())
            .collect()
    }

    fn analyze(signal: &[f64], scales: &[f64]) -> CwtResult {
        CwtTransform::new(Arc::new(Morlet::default()), CwtConfig::default())
            .unwrap()
            .analyze(signal, scales)
            .unwrap()
    }

    fn sinusoid(n: usize, period: f64) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * i as f64 / period).sin()).collect()
    }

    fn rms(values: &[f64]) -> f64 {
        (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
    }

    #[test]
    fn test_log_scale_weights() {
        assert_eq!(log_scale_weights(&[3.0]), vec![1.0]);
        let w = log_scale_weights(&[1.0, 2.0, 4.0, 8.0]);
        let ln2 = 2f64.ln();
        assert_relative_eq!(w[0], ln2 / 2.0);
        assert_relative_eq!(w[1], ln2);
        assert_relative_eq!(w[2], ln2);
        assert_relative_eq!(w[3], ln2 / 2.0);
    }

    #[test]
    fn test_round_trip_recovers_sinusoid() {
        let n = 512;
        let signal = sinusoid(n, 32.0);
        let result = analyze(&signal, &log_scales(4.0, 128.0, 81));
        let inverse = InverseCwt::new(Arc::new(Morlet::default())).unwrap();
        let rebuilt = inverse.reconstruct(&result).unwrap();
        assert_eq!(rebuilt.len(), n);

        let error: Vec<f64> = (128..384).map(|i| rebuilt[i] - signal[i]).collect();
        assert!(rms(&error) < 1e-2 * rms(&signal[128..384]));
    }

    #[test]
    fn test_direct_and_fft_integration_agree() {
        let signal: Vec<f64> = (0..300).map(|i| (i as f64 * 0.15).sin() + 0.3 * (i as f64 * 0.9).cos()).collect();
        let result = analyze(&signal, &log_scales(2.0, 40.0, 24));
        let inverse = InverseCwt::with_config(
            Arc::new(Morlet::default()),
            InverseConfig::new().with_tolerance(0.0),
        )
        .unwrap();
        let direct = inverse.reconstruct_direct(&result).unwrap();
        let fft = inverse.reconstruct_fft(&result).unwrap();
        let scale = direct.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        for (a, b) in direct.iter().zip(&fft) {
            assert!((a - b).abs() <= 1e-9 * scale.max(1.0));
        }
    }

    #[test]
    fn test_disjoint_bands_sum_to_full() {
        let signal = sinusoid(256, 20.0);
        let scales = log_scales(2.0, 64.0, 30);
        let result = analyze(&signal, &scales);
        let inverse = InverseCwt::new(Arc::new(Morlet::default())).unwrap();

        let full = inverse.reconstruct(&result).unwrap();
        let low = inverse.reconstruct_band(&result, 1.0, 10.0).unwrap();
        let high = inverse.reconstruct_band(&result, 10.000001, 1e9).unwrap();
        for ((f, l), h) in full.iter().zip(&low).zip(&high) {
            assert!((f - (l + h)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_frequency_band_matches_scale_band() {
        let signal = sinusoid(256, 20.0);
        let result = analyze(&signal, &log_scales(2.0, 64.0, 30));
        let inverse = InverseCwt::new(Arc::new(Morlet::default())).unwrap();
        // fc = 1, fs = 100: 5..25 Hz is scales 4..20
        let by_frequency = inverse.reconstruct_frequency_band(&result, 5.0, 25.0, 100.0).unwrap();
        let by_scale = inverse.reconstruct_band(&result, 4.0, 20.0).unwrap();
        assert_eq!(by_frequency, by_scale);
    }

    #[test]
    fn test_band_edge_cases() {
        let result = analyze(&sinusoid(64, 8.0), &[2.0, 4.0, 8.0]);
        let inverse = InverseCwt::new(Arc::new(Morlet::default())).unwrap();
        assert_eq!(inverse.reconstruct_band(&result, 100.0, 200.0).unwrap(), vec![0.0; 64]);
        assert_eq!(
            inverse.reconstruct_band(&result, 8.0, 2.0),
            Err(CwtError::InvalidRange { min: 8.0, max: 2.0 })
        );
        assert!(inverse.reconstruct_frequency_band(&result, 10.0, 1.0, 100.0).is_err());
    }

    #[test]
    fn test_non_positive_band_bounds_are_rejected() {
        let result = analyze(&sinusoid(64, 8.0), &[2.0, 4.0, 8.0]);
        let inverse = InverseCwt::new(Arc::new(Morlet::default())).unwrap();
        assert_eq!(
            inverse.reconstruct_band(&result, 0.0, 10.0),
            Err(CwtError::NonPositive { name: "min_scale", value: 0.0 })
        );
        assert_eq!(
            inverse.reconstruct_band(&result, -5.0, 10.0),
            Err(CwtError::NonPositive { name: "min_scale", value: -5.0 })
        );
        assert_eq!(
            inverse.reconstruct_band(&result, -10.0, -5.0),
            Err(CwtError::NonPositive { name: "min_scale", value: -10.0 })
        );
        assert!(matches!(
            inverse.reconstruct_band(&result, 2.0, f64::NAN),
            Err(CwtError::NonPositive { name: "max_scale", .. })
        ));
    }

    #[test]
    fn test_complex_results_need_real_part() {
        let wavelet: Arc<dyn ContinuousWavelet> = Arc::new(ComplexMorlet::new(1.0, 1.0).unwrap());
        let signal = sinusoid(128, 16.0);
        let result = CwtTransform::with_defaults(wavelet.clone())
            .unwrap()
            .analyze(&signal, &log_scales(4.0, 64.0, 33))
            .unwrap();
        let inverse = InverseCwt::new(wavelet).unwrap();
        assert!(matches!(inverse.reconstruct(&result), Err(CwtError::Unsupported(_))));
        assert!(matches!(inverse.reconstruct_fft(&result), Err(CwtError::Unsupported(_))));

        let rebuilt = inverse.reconstruct_real_part(&result).unwrap();
        assert_eq!(rebuilt.len(), 128);
        assert!(rebuilt.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_single_scale_and_zero_signal() {
        let inverse = InverseCwt::new(Arc::new(Morlet::default())).unwrap();
        let zeros = CwtResult::real(Array2::zeros((1, 50)), vec![4.0]).unwrap();
        assert_eq!(inverse.reconstruct(&zeros).unwrap(), vec![0.0; 50]);

        let result = analyze(&sinusoid(50, 8.0), &[4.0]);
        let rebuilt = inverse.reconstruct(&result).unwrap();
        assert!(rebuilt.iter().all(|v| v.is_finite()));
        assert!(rebuilt.iter().any(|v| v.abs() > 0.0));
    }

    #[test]
    fn test_inadmissible_wavelet_is_rejected() {
        let shannon = Arc::new(Shannon::new(4.0, 1.0).unwrap());
        assert!(matches!(InverseCwt::new(shannon), Err(CwtError::Inadmissible { .. })));
    }
}
