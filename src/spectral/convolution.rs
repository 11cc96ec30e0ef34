// src/spectral/convolution.rs
//! Direct time-domain convolution with boundary handling.

use log::trace;

use crate::config::{CwtConfig, DEFAULT_BLOCK_SIZE, DEFAULT_BLOCK_THRESHOLD};
use crate::error::{ensure_positive, CwtError, Result};
use crate::utils::array::{pad_signal, BoundaryMode};

/// Direct convolution of a signal with sampled wavelet taps.
///
/// For every output position `τ`:
///
/// ```text
/// y[τ] = Σ_i x[τ + i - L/2] · k[i] / √scale
/// ```
///
/// with out-of-range samples supplied by the boundary mode. The scalar and
/// blocked loops accumulate each output in the same order and produce
/// bit-identical results.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionEngine {
    boundary: BoundaryMode,
    block_threshold: usize,
    block_size: usize,
}

impl ConvolutionEngine {
    pub fn new(boundary: BoundaryMode) -> Self {
        ConvolutionEngine {
            boundary,
            block_threshold: DEFAULT_BLOCK_THRESHOLD,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn from_config(config: &CwtConfig) -> Self {
        ConvolutionEngine {
            boundary: config.boundary(),
            block_threshold: config.block_threshold(),
            block_size: config.block_size().max(1),
        }
    }

    /// Sets the signal length from which the blocked loop is used.
    pub fn with_blocking(mut self, threshold: usize, block_size: usize) -> Self {
        self.block_threshold = threshold;
        self.block_size = block_size.max(1);
        self
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    /// Convolves with the engine's boundary mode, picking the scalar or
    /// blocked loop by signal length.
    pub fn convolve(&self, signal: &[f64], kernel: &[f64], scale: f64) -> Result<Vec<f64>> {
        validate(signal, kernel, scale)?;
        if signal.len() >= self.block_threshold {
            trace!("blocked convolution: n={} taps={} block={}", signal.len(), kernel.len(), self.block_size);
            Ok(self.convolve_blocked(signal, kernel, scale, self.block_size))
        } else {
            Ok(self.convolve_scalar(signal, kernel, scale))
        }
    }

    /// Plain O(N·L) loop.
    pub fn convolve_scalar(&self, signal: &[f64], kernel: &[f64], scale: f64) -> Vec<f64> {
        let n = signal.len();
        let taps = kernel.len();
        let half = (taps / 2) as isize;
        let norm = scale.sqrt();

        (0..n)
            .map(|tau| {
                let start = tau as isize - half;
                let sum = if start >= 0 && start as usize + taps <= n {
                    // Interior: no boundary lookups
                    let window = &signal[start as usize..start as usize + taps];
                    dot(window, kernel)
                } else {
                    let mut acc = 0.0;
                    for (i, &k) in kernel.iter().enumerate() {
                        acc += self.boundary.value_at(signal, start + i as isize) * k;
                    }
                    acc
                };
                sum / norm
            })
            .collect()
    }

    /// Cache-blocked loop: the output is produced in blocks of
    /// `block_size` positions, each reading one contiguous extended window.
    pub fn convolve_blocked(
        &self,
        signal: &[f64],
        kernel: &[f64],
        scale: f64,
        block_size: usize,
    ) -> Vec<f64> {
        let n = signal.len();
        let taps = kernel.len();
        let half = (taps / 2) as isize;
        let norm = scale.sqrt();
        let block_size = block_size.max(1);

        let mut output = vec![0.0; n];
        let mut window = Vec::with_capacity(block_size + taps);

        for (block_index, out_block) in output.chunks_mut(block_size).enumerate() {
            let block_start = block_index * block_size;
            let first = block_start as isize - half;

            // Extended window covering every tap of every output in the block
            window.clear();
            window.extend(
                (0..out_block.len() + taps - 1)
                    .map(|j| self.boundary.value_at(signal, first + j as isize)),
            );

            for (offset, out) in out_block.iter_mut().enumerate() {
                *out = dot(&window[offset..offset + taps], kernel) / norm;
            }
        }
        output
    }

    /// Extends the signal by `len(kernel)` samples per side with `mode`,
    /// convolves, and trims back to the signal length.
    pub fn convolve_with_padding(
        &self,
        signal: &[f64],
        kernel: &[f64],
        scale: f64,
        mode: BoundaryMode,
    ) -> Result<Vec<f64>> {
        validate(signal, kernel, scale)?;
        let n = signal.len();
        let taps = kernel.len();
        let half = taps / 2;
        let norm = scale.sqrt();

        let padded = pad_signal(signal, taps, taps, mode);
        let padded = padded.as_slice().ok_or_else(|| {
            CwtError::InvalidParameter("padded signal is not contiguous".to_string())
        })?;

        Ok((0..n)
            .map(|tau| {
                let start = tau + taps - half;
                dot(&padded[start..start + taps], kernel) / norm
            })
            .collect())
    }
}

impl Default for ConvolutionEngine {
    fn default() -> Self {
        Self::new(BoundaryMode::Periodic)
    }
}

#[inline]
fn dot(window: &[f64], kernel: &[f64]) -> f64 {
    let mut acc = 0.0;
    for (x, k) in window.iter().zip(kernel) {
        acc += x * k;
    }
    acc
}

fn validate(signal: &[f64], kernel: &[f64], scale: f64) -> Result<()> {
    if signal.is_empty() {
        return Err(CwtError::EmptyInput("signal"));
    }
    if kernel.is_empty() {
        return Err(CwtError::EmptyInput("kernel"));
    }
    ensure_positive("scale", scale)?;
    Ok(())
}
