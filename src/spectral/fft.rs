// src/spectral/fft.rs
//! FFT primitives and the per-length plan cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::trace;
use num_complex::Complex64;
use parking_lot::RwLock;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::error::{CwtError, Result};
use crate::utils::array::next_power_of_2;
use crate::utils::simd;

/// Lengths above this are planned on demand and never stored.
pub const MAX_CACHED_LENGTH: usize = 1 << 20;

/// Forward/inverse plans for one transform length.
struct PlanSet {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    real_forward: Arc<dyn RealToComplex<f64>>,
    real_inverse: Arc<dyn ComplexToReal<f64>>,
}

impl PlanSet {
    /// Planners are not shareable across threads, so each miss plans with
    /// fresh ones; only the finished plans are stored.
    fn build(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let mut real_planner = RealFftPlanner::new();
        PlanSet {
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
            real_forward: real_planner.plan_fft_forward(len),
            real_inverse: real_planner.plan_fft_inverse(len),
        }
    }
}

/// Compute-or-fetch cache of FFT plans keyed by length.
///
/// Entries are never evicted; lengths above the cap bypass the cache.
pub struct FftCache {
    plans: RwLock<HashMap<usize, Arc<PlanSet>>>,
    max_cached: usize,
}

impl FftCache {
    pub fn new() -> Self {
        Self::with_max_length(MAX_CACHED_LENGTH)
    }

    pub fn with_max_length(max_cached: usize) -> Self {
        FftCache {
            plans: RwLock::new(HashMap::new()),
            max_cached,
        }
    }

    /// Number of cached lengths.
    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, len: usize) -> Arc<PlanSet> {
        if len > self.max_cached {
            trace!("planning uncached FFT of length {len}");
            return Arc::new(PlanSet::build(len));
        }
        if let Some(plans) = self.plans.read().get(&len) {
            return Arc::clone(plans);
        }

        let built = Arc::new(PlanSet::build(len));
        let mut plans = self.plans.write();
        Arc::clone(plans.entry(len).or_insert(built))
    }
}

impl Default for FftCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FftCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftCache")
            .field("cached_lengths", &self.len())
            .field("max_cached", &self.max_cached)
            .finish()
    }
}

/// FFT/IFFT and FFT-based convolution.
///
/// All public transforms require power-of-two lengths and finite input.
#[derive(Debug, Clone)]
pub struct SpectralKernel {
    cache: Option<Arc<FftCache>>,
}

impl SpectralKernel {
    /// Kernel with its own plan cache.
    pub fn new() -> Self {
        SpectralKernel {
            cache: Some(Arc::new(FftCache::new())),
        }
    }

    /// Kernel sharing an existing cache.
    pub fn with_cache(cache: Arc<FftCache>) -> Self {
        SpectralKernel { cache: Some(cache) }
    }

    /// Kernel that plans every call from scratch.
    pub fn uncached() -> Self {
        SpectralKernel { cache: None }
    }

    pub fn cache(&self) -> Option<&Arc<FftCache>> {
        self.cache.as_ref()
    }

    fn plans(&self, len: usize) -> Arc<PlanSet> {
        match &self.cache {
            Some(cache) => cache.get(len),
            None => Arc::new(PlanSet::build(len)),
        }
    }

    /// Full complex spectrum of a real signal.
    pub fn fft(&self, x: &[f64]) -> Result<Vec<Complex64>> {
        check_length(x.len())?;
        check_finite_real("fft input", x)?;

        let n = x.len();
        let half = self.real_spectrum(x)?;
        let mut spectrum = Vec::with_capacity(n);
        spectrum.extend_from_slice(&half);
        // Hermitian symmetry fills the negative frequencies
        for k in half.len()..n {
            spectrum.push(half[n - k].conj());
        }
        Ok(spectrum)
    }

    /// Real part of the inverse transform, scaled by `1/N`.
    pub fn ifft(&self, spectrum: &[Complex64]) -> Result<Vec<f64>> {
        check_length(spectrum.len())?;
        check_finite_complex("ifft input", spectrum)?;

        let mut buffer = spectrum.to_vec();
        self.ifft_complex_in_place(&mut buffer)?;
        Ok(buffer.into_iter().map(|c| c.re).collect())
    }

    /// In-place forward complex FFT.
    pub fn fft_complex_in_place(&self, buffer: &mut [Complex64]) -> Result<()> {
        check_length(buffer.len())?;
        self.plans(buffer.len()).forward.process(buffer);
        Ok(())
    }

    /// In-place inverse complex FFT, scaled by `1/N`.
    pub fn ifft_complex_in_place(&self, buffer: &mut [Complex64]) -> Result<()> {
        check_length(buffer.len())?;
        self.plans(buffer.len()).inverse.process(buffer);
        let scale = 1.0 / buffer.len() as f64;
        buffer.iter_mut().for_each(|c| *c *= scale);
        Ok(())
    }

    /// Non-negative half spectrum (`N/2 + 1` bins) of a real signal.
    pub(crate) fn real_spectrum(&self, x: &[f64]) -> Result<Vec<Complex64>> {
        check_length(x.len())?;
        let plan = Arc::clone(&self.plans(x.len()).real_forward);
        let mut input = x.to_vec();
        let mut output = plan.make_output_vec();
        plan.process(&mut input, &mut output)
            .map_err(|e| CwtError::InvalidParameter(format!("real FFT failed: {e}")))?;
        Ok(output)
    }

    /// Inverse of [`real_spectrum`](Self::real_spectrum), scaled by `1/N`.
    pub(crate) fn real_inverse(&self, mut half: Vec<Complex64>, n: usize) -> Result<Vec<f64>> {
        check_length(n)?;
        if half.len() != n / 2 + 1 {
            return Err(CwtError::DimensionMismatch {
                what: "half spectrum length",
                expected: n / 2 + 1,
                actual: half.len(),
            });
        }
        // Imaginary parts of the DC and Nyquist bins carry no information
        half[0].im = 0.0;
        if n % 2 == 0 {
            half[n / 2].im = 0.0;
        }

        let plan = Arc::clone(&self.plans(n).real_inverse);
        let mut output = plan.make_output_vec();
        plan.process(&mut half, &mut output)
            .map_err(|e| CwtError::InvalidParameter(format!("inverse real FFT failed: {e}")))?;
        let scale = 1.0 / n as f64;
        output.iter_mut().for_each(|v| *v *= scale);
        Ok(output)
    }

    /// Circular convolution of two equal-length signals.
    pub fn convolve_circular(&self, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
        check_pair(a, b)?;
        let fa = self.real_spectrum(a)?;
        let fb = self.real_spectrum(b)?;
        let product = fa.iter().zip(&fb).map(|(x, y)| x * y).collect();
        self.real_inverse(product, a.len())
    }

    /// Circular cross-correlation `y[τ] = Σ a[τ + j]·b[j]`.
    pub fn correlate_circular(&self, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
        check_pair(a, b)?;
        let mut fa = self.real_spectrum(a)?;
        let fb = self.real_spectrum(b)?;
        simd::mul_conj_in_place(&mut fa, &fb);
        self.real_inverse(fa, a.len())
    }

    /// Full linear convolution, `len(signal) + len(kernel) - 1` samples.
    ///
    /// Both operands are zero-padded to the next power of two at least that
    /// long, so no circular wrap-around reaches the output.
    pub fn convolve_linear(&self, signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>> {
        if signal.is_empty() {
            return Err(CwtError::EmptyInput("signal"));
        }
        if kernel.is_empty() {
            return Err(CwtError::EmptyInput("kernel"));
        }
        check_finite_real("signal", signal)?;
        check_finite_real("kernel", kernel)?;

        let out_len = signal.len() + kernel.len() - 1;
        let n = next_power_of_2(out_len);
        trace!("linear convolution {}x{} via FFT of length {n}", signal.len(), kernel.len());

        let mut a = vec![0.0; n];
        a[..signal.len()].copy_from_slice(signal);
        let mut b = vec![0.0; n];
        b[..kernel.len()].copy_from_slice(kernel);

        let mut result = self.convolve_circular(&a, &b)?;
        result.truncate(out_len);
        Ok(result)
    }
}

impl Default for SpectralKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn check_length(len: usize) -> Result<()> {
    if len == 0 || !len.is_power_of_two() {
        Err(CwtError::NotPowerOfTwo(len))
    } else {
        Ok(())
    }
}

fn check_pair(a: &[f64], b: &[f64]) -> Result<()> {
    check_length(a.len())?;
    if a.len() != b.len() {
        return Err(CwtError::DimensionMismatch {
            what: "circular operand length",
            expected: a.len(),
            actual: b.len(),
        });
    }
    check_finite_real("first operand", a)?;
    check_finite_real("second operand", b)
}

fn check_finite_real(name: &'static str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(CwtError::NonFinite { name, index }),
        None => Ok(()),
    }
}

fn check_finite_complex(name: &'static str, values: &[Complex64]) -> Result<()> {
    match values.iter().position(|c| !c.re.is_finite() || !c.im.is_finite()) {
        Some(index) => Err(CwtError::NonFinite { name, index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn naive_dft(x: &[f64]) -> Vec<Complex64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                x.iter()
                    .enumerate()
                    .map(|(t, &v)| Complex64::from_polar(v, -2.0 * PI * (k * t) as f64 / n as f64))
                    .sum()
            })
            .collect()
    }

    #[test]
    fn test_fft_matches_dft() {
        let kernel = SpectralKernel::new();
        let x: Vec<f64> = (0..16).map(|i| (i as f64 * 0.7).sin() + 0.1 * i as f64).collect();
        let fast = kernel.fft(&x).unwrap();
        let slow = naive_dft(&x);
        for (a, b) in fast.iter().zip(&slow) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-10);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_ifft_inverts_fft() {
        let kernel = SpectralKernel::new();
        let x: Vec<f64> = (0..64).map(|i| ((i * i) % 7) as f64 - 3.0).collect();
        let back = kernel.ifft(&kernel.fft(&x).unwrap()).unwrap();
        for (a, b) in x.iter().zip(&back) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_validation() {
        let kernel = SpectralKernel::new();
        assert_eq!(kernel.fft(&[1.0, 2.0, 3.0]), Err(CwtError::NotPowerOfTwo(3)));
        assert_eq!(kernel.fft(&[]), Err(CwtError::NotPowerOfTwo(0)));
        assert_eq!(
            kernel.fft(&[1.0, f64::NAN]),
            Err(CwtError::NonFinite { name: "fft input", index: 1 })
        );
        let spectrum = vec![Complex64::new(0.0, f64::INFINITY); 4];
        assert!(matches!(kernel.ifft(&spectrum), Err(CwtError::NonFinite { .. })));
    }

    #[test]
    fn test_cached_and_uncached_agree() {
        let cached = SpectralKernel::new();
        let uncached = SpectralKernel::uncached();
        let x: Vec<f64> = (0..256).map(|i| (i as f64 * 0.05).cos()).collect();
        assert_eq!(cached.fft(&x).unwrap(), uncached.fft(&x).unwrap());
        // second call hits the cache
        assert_eq!(cached.fft(&x).unwrap(), uncached.fft(&x).unwrap());
        assert_eq!(cached.cache().map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_oversized_lengths_bypass_cache() {
        let cache = Arc::new(FftCache::with_max_length(8));
        let kernel = SpectralKernel::with_cache(Arc::clone(&cache));
        kernel.fft(&[1.0; 16]).unwrap();
        assert!(cache.is_empty());
        kernel.fft(&[1.0; 8]).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_convolve_linear_matches_direct_sum() {
        let kernel = SpectralKernel::new();
        let signal = [1.0, 2.0, 3.0, 4.0, 5.0];
        let taps = [0.5, -1.0, 0.25];
        let result = kernel.convolve_linear(&signal, &taps).unwrap();
        assert_eq!(result.len(), 7);

        for (n, value) in result.iter().enumerate() {
            let expected: f64 = (0..taps.len())
                .filter(|&k| n >= k && n - k < signal.len())
                .map(|k| signal[n - k] * taps[k])
                .sum();
            assert_abs_diff_eq!(*value, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_correlation_vs_convolution() {
        let kernel = SpectralKernel::new();
        let a: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let b = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5];
        let corr = kernel.correlate_circular(&a, &b).unwrap();
        let conv = kernel.convolve_circular(&a, &b).unwrap();
        for tau in 0..8 {
            // correlation: a[τ] + 0.5·a[τ+7]; convolution: a[τ] + 0.5·a[τ-7]
            assert_abs_diff_eq!(corr[tau], a[tau] + 0.5 * a[(tau + 7) % 8], epsilon = 1e-12);
            assert_abs_diff_eq!(conv[tau], a[tau] + 0.5 * a[(tau + 1) % 8], epsilon = 1e-12);
        }
    }
}
