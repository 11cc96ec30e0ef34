// src/spectral/cwt.rs
use std::sync::Arc;

use log::{debug, trace};
use ndarray::Array2;
use rayon::prelude::*;

use crate::config::{Algorithm, CwtConfig};
use crate::error::{ensure_positive, validate_scales, validate_signal, CwtError, Result};
use crate::spectral::convolution::ConvolutionEngine;
use crate::spectral::fft::SpectralKernel;
use crate::spectral::result::CwtResult;
use crate::utils::array::{fill_circular, BoundaryMode};
use crate::utils::simd;
use crate::wavelets::ContinuousWavelet;

/// Longest wavelet window, in samples, any path will sample.
pub const MAX_SUPPORT: usize = 1 << 30;

/// Number of wavelet samples at `scale`: `ceil(8·scale·bandwidth)`, forced
/// odd so the window has a centre tap.
///
/// # Errors
/// [`CwtError::InvalidParameter`] when the window is not finite or longer
/// than [`MAX_SUPPORT`].
pub fn support_length(scale: f64, bandwidth: f64) -> Result<usize> {
    let width = (8.0 * scale * bandwidth).ceil().max(1.0);
    // Negated so NaN fails too
    if !(width <= MAX_SUPPORT as f64) {
        return Err(CwtError::InvalidParameter(format!(
            "wavelet support at scale {scale} spans {width:e} samples (limit {MAX_SUPPORT})"
        )));
    }
    Ok(width as usize | 1)
}

/// Samples `psi((i - L/2) / scale)` for `i in 0..L`.
pub fn sample_wavelet(wavelet: &dyn ContinuousWavelet, scale: f64) -> Result<Vec<f64>> {
    let len = support_length(scale, wavelet.bandwidth())?;
    let half = (len / 2) as f64;
    Ok((0..len).map(|i| wavelet.psi((i as f64 - half) / scale)).collect())
}

/// Samples the imaginary part on the same grid as [`sample_wavelet`]; zeros
/// for real wavelets.
pub fn sample_wavelet_imaginary(wavelet: &dyn ContinuousWavelet, scale: f64) -> Result<Vec<f64>> {
    let len = support_length(scale, wavelet.bandwidth())?;
    let half = (len / 2) as f64;
    Ok((0..len)
        .map(|i| wavelet.psi_imaginary((i as f64 - half) / scale))
        .collect())
}

/// Forward continuous wavelet transform.
///
/// Stateless between calls: every [`analyze`](Self::analyze) reads only the
/// immutable wavelet and configuration, so one instance can serve many
/// threads.
///
/// ```
/// use std::sync::Arc;
/// use cwt_rs::{CwtConfig, CwtTransform, Morlet};
///
/// let transform = CwtTransform::new(Arc::new(Morlet::default()), CwtConfig::default()).unwrap();
/// let signal: Vec<f64> = (0..128).map(|i| (i as f64 * 0.2).sin()).collect();
/// let result = transform.analyze(&signal, &[4.0, 8.0, 16.0]).unwrap();
/// assert_eq!(result.coefficients().dim(), (3, 128));
/// ```
#[derive(Debug, Clone)]
pub struct CwtTransform {
    wavelet: Arc<dyn ContinuousWavelet>,
    config: CwtConfig,
    engine: ConvolutionEngine,
    kernel: SpectralKernel,
}

impl CwtTransform {
    pub fn new(wavelet: Arc<dyn ContinuousWavelet>, config: CwtConfig) -> Result<Self> {
        config.validate()?;
        ensure_positive("wavelet bandwidth", wavelet.bandwidth())?;
        ensure_positive("wavelet center frequency", wavelet.center_frequency())?;
        let engine = ConvolutionEngine::from_config(&config);
        Ok(CwtTransform {
            wavelet,
            config,
            engine,
            kernel: SpectralKernel::new(),
        })
    }

    /// Transform with [`CwtConfig::default`].
    pub fn with_defaults(wavelet: Arc<dyn ContinuousWavelet>) -> Result<Self> {
        Self::new(wavelet, CwtConfig::default())
    }

    /// Shares an FFT plan cache with other components.
    pub fn with_spectral_kernel(mut self, kernel: SpectralKernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn wavelet(&self) -> &Arc<dyn ContinuousWavelet> {
        &self.wavelet
    }

    pub fn config(&self) -> &CwtConfig {
        &self.config
    }

    /// Whether [`analyze`](Self::analyze) takes the FFT path for a signal of
    /// `len` samples.
    pub fn uses_fft(&self, len: usize) -> bool {
        if self.wavelet.is_complex() {
            return false;
        }
        match self.config.algorithm() {
            Algorithm::Direct => false,
            Algorithm::Fft => true,
            Algorithm::Auto => self.config.fft_enabled() && len >= self.config.fft_threshold(),
        }
    }

    /// Computes the CWT of `signal` at `scales`, choosing the FFT or direct
    /// path. Complex wavelets always produce a complex result.
    pub fn analyze(&self, signal: &[f64], scales: &[f64]) -> Result<CwtResult> {
        validate_signal(signal)?;
        validate_scales(scales)?;

        if self.uses_fft(signal.len()) {
            debug!("CWT via FFT: n={} scales={}", signal.len(), scales.len());
            self.fft_unchecked(signal, scales)
        } else {
            debug!(
                "CWT via direct convolution: n={} scales={} complex={}",
                signal.len(),
                scales.len(),
                self.wavelet.is_complex()
            );
            self.direct_unchecked(signal, scales)
        }
    }

    /// Direct time-domain path regardless of size.
    pub fn analyze_direct(&self, signal: &[f64], scales: &[f64]) -> Result<CwtResult> {
        validate_signal(signal)?;
        validate_scales(scales)?;
        self.direct_unchecked(signal, scales)
    }

    /// FFT path regardless of size. Only real wavelets are supported.
    pub fn analyze_fft(&self, signal: &[f64], scales: &[f64]) -> Result<CwtResult> {
        validate_signal(signal)?;
        validate_scales(scales)?;
        if self.wavelet.is_complex() {
            return Err(CwtError::Unsupported(format!(
                "FFT path targets real wavelets; {} is complex",
                self.wavelet.name()
            )));
        }
        self.fft_unchecked(signal, scales)
    }

    fn norm_scale(&self, scale: f64) -> f64 {
        if self.config.normalize_scales() {
            scale
        } else {
            1.0
        }
    }

    /// Runs `row` for every scale, in parallel once the scale count reaches
    /// the configured threshold. Output order follows `scales`.
    fn map_scales<T, F>(&self, scales: &[f64], row: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(f64) -> Result<T> + Sync + Send,
    {
        if scales.len() >= self.config.parallel_threshold() {
            scales.par_iter().map(|&s| row(s)).collect()
        } else {
            scales.iter().map(|&s| row(s)).collect()
        }
    }

    fn direct_unchecked(&self, signal: &[f64], scales: &[f64]) -> Result<CwtResult> {
        let n = signal.len();
        let boundary = self.engine.boundary();

        if self.wavelet.is_complex() {
            let rows = self.map_scales(scales, |scale| self.complex_row(signal, scale))?;
            let (re_rows, im_rows): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
            let re = assemble(re_rows, scales.len(), n)?;
            let im = assemble(im_rows, scales.len(), n)?;
            return CwtResult::complex(re, im, scales.to_vec())?
                .with_center_frequency(self.wavelet.center_frequency());
        }

        let rows = self.map_scales(scales, |scale| {
            let taps = sample_wavelet(self.wavelet.as_ref(), scale)?;
            let norm = self.norm_scale(scale);
            trace!("direct row: scale={scale} taps={}", taps.len());
            // Non-periodic modes go through explicit padding so edge rows see
            // the extended signal rather than wrapped samples.
            match boundary {
                BoundaryMode::Periodic => self.engine.convolve(signal, &taps, norm),
                mode => self.engine.convolve_with_padding(signal, &taps, norm, mode),
            }
        })?;

        CwtResult::real(assemble(rows, scales.len(), n)?, scales.to_vec())?
            .with_center_frequency(self.wavelet.center_frequency())
    }

    /// Correlation with the conjugate wavelet: real part `Σ x·ψ_re`,
    /// imaginary part `-Σ x·ψ_im`, boundary values resolved inline.
    fn complex_row(&self, signal: &[f64], scale: f64) -> Result<(Vec<f64>, Vec<f64>)> {
        let taps_re = sample_wavelet(self.wavelet.as_ref(), scale)?;
        let taps_im = sample_wavelet_imaginary(self.wavelet.as_ref(), scale)?;
        let half = (taps_re.len() / 2) as isize;
        let norm = self.norm_scale(scale).sqrt();
        let boundary = self.engine.boundary();

        let mut re = Vec::with_capacity(signal.len());
        let mut im = Vec::with_capacity(signal.len());
        for tau in 0..signal.len() {
            let start = tau as isize - half;
            let (mut acc_re, mut acc_im) = (0.0, 0.0);
            for (i, (&wr, &wi)) in taps_re.iter().zip(&taps_im).enumerate() {
                let x = boundary.value_at(signal, start + i as isize);
                acc_re += x * wr;
                acc_im += x * wi;
            }
            re.push(acc_re / norm);
            im.push(-acc_im / norm);
        }
        Ok((re, im))
    }

    /// FFT length for a signal of `n` samples and widest half-support
    /// `half_max`: the configured size when it fits, else the next power of
    /// two above `n + 2·half_max`.
    ///
    /// # Errors
    /// [`CwtError::InvalidParameter`] when that length overflows `usize`.
    pub fn fft_length(&self, n: usize, half_max: usize) -> Result<usize> {
        let overflow = || {
            CwtError::InvalidParameter(format!("FFT length for n={n}, half support {half_max} overflows"))
        };
        let required = half_max
            .checked_mul(2)
            .and_then(|width| width.checked_add(n))
            .ok_or_else(overflow)?;
        match self.config.fft_size() {
            Some(size) if size >= required => Ok(size),
            _ => required.max(1).checked_next_power_of_two().ok_or_else(overflow),
        }
    }

    fn fft_unchecked(&self, signal: &[f64], scales: &[f64]) -> Result<CwtResult> {
        let n = signal.len();
        let bandwidth = self.wavelet.bandwidth();
        let mut half_max = 0;
        for &scale in scales {
            half_max = half_max.max(support_length(scale, bandwidth)? / 2);
        }
        let m = self.fft_length(n, half_max)?;
        trace!("FFT buffer: n={n} half_support={half_max} m={m}");

        // Signal plus its boundary extension, laid out circularly so that
        // negative offsets wrap to the end of the buffer.
        let mut buffer = vec![0.0; m];
        fill_circular(signal, &mut buffer, half_max, half_max, self.engine.boundary());
        let spectrum = self.kernel.real_spectrum(&buffer)?;

        let rows = self.map_scales(scales, |scale| {
            let len = support_length(scale, bandwidth)?;
            let half = (len / 2) as isize;
            let mut taps = vec![0.0; m];
            for j in -half..=half {
                taps[j.rem_euclid(m as isize) as usize] = self.wavelet.psi(j as f64 / scale);
            }

            let wavelet_spectrum = self.kernel.real_spectrum(&taps)?;
            let mut product = spectrum.clone();
            simd::mul_conj_in_place(&mut product, &wavelet_spectrum);
            let mut row = self.kernel.real_inverse(product, m)?;

            row.truncate(n);
            let norm = self.norm_scale(scale).sqrt();
            row.iter_mut().for_each(|v| *v /= norm);
            Ok(row)
        })?;

        CwtResult::real(assemble(rows, scales.len(), n)?, scales.to_vec())?
            .with_center_frequency(self.wavelet.center_frequency())
    }
}

fn assemble(rows: Vec<Vec<f64>>, num_scales: usize, n: usize) -> Result<Array2<f64>> {
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((num_scales, n), flat)
        .map_err(|e| CwtError::InvalidParameter(format!("coefficient matrix shape: {e}")))
}

/// One-shot transform with the default configuration.
pub fn cwt(
    signal: &[f64],
    scales: &[f64],
    wavelet: Arc<dyn ContinuousWavelet>,
) -> Result<CwtResult> {
    CwtTransform::with_defaults(wavelet)?.analyze(signal, scales)
}
