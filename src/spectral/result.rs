// src/spectral/result.rs
//! Immutable coefficient container with lazily cached derived views.

use std::sync::OnceLock;

use ndarray::{Array2, ArrayView2, Axis, Zip};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::error::{ensure_positive, validate_scales, CwtError, Result};
use crate::utils::simd;

/// Coefficient storage: one real matrix, or parallel real/imaginary matrices.
#[derive(Debug, Clone, PartialEq)]
pub enum Coefficients {
    Real(Array2<f64>),
    Complex { re: Array2<f64>, im: Array2<f64> },
}

impl Coefficients {
    fn real_part(&self) -> &Array2<f64> {
        match self {
            Coefficients::Real(values) => values,
            Coefficients::Complex { re, .. } => re,
        }
    }
}

/// Location and value of the largest-magnitude coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxCoefficient {
    pub scale_index: usize,
    pub time_index: usize,
    pub scale: f64,
    /// Magnitude of the coefficient.
    pub value: f64,
}

/// Result of a forward CWT: `num_scales × num_samples` coefficients plus the
/// scales they were computed at.
///
/// Accessors return owned copies. Derived views are computed on first use
/// and cached for the life of the value.
#[derive(Debug, Clone)]
pub struct CwtResult {
    coefficients: Coefficients,
    scales: Vec<f64>,
    center_frequency: f64,
    magnitude: OnceLock<Array2<f64>>,
    phase: OnceLock<Option<Array2<f64>>>,
    power: OnceLock<Array2<f64>>,
    time_averaged: OnceLock<Vec<f64>>,
    maximum: OnceLock<MaxCoefficient>,
}

impl CwtResult {
    /// Wraps a real coefficient matrix. Rows must match the scale count.
    pub fn real(coefficients: Array2<f64>, scales: Vec<f64>) -> Result<Self> {
        check_shape(&coefficients, &scales)?;
        Ok(Self::from_parts(Coefficients::Real(coefficients), scales))
    }

    /// Wraps parallel real and imaginary matrices of identical shape.
    pub fn complex(re: Array2<f64>, im: Array2<f64>, scales: Vec<f64>) -> Result<Self> {
        check_shape(&re, &scales)?;
        if re.dim() != im.dim() {
            return Err(CwtError::DimensionMismatch {
                what: "imaginary coefficient count",
                expected: re.len(),
                actual: im.len(),
            });
        }
        Ok(Self::from_parts(Coefficients::Complex { re, im }, scales))
    }

    /// Records the centre frequency used by [`frequencies`](Self::frequencies).
    /// Defaults to 1.0.
    pub fn with_center_frequency(mut self, center_frequency: f64) -> Result<Self> {
        self.center_frequency = ensure_positive("center frequency", center_frequency)?;
        Ok(self)
    }

    fn from_parts(coefficients: Coefficients, scales: Vec<f64>) -> Self {
        CwtResult {
            coefficients,
            scales,
            center_frequency: 1.0,
            magnitude: OnceLock::new(),
            phase: OnceLock::new(),
            power: OnceLock::new(),
            time_averaged: OnceLock::new(),
            maximum: OnceLock::new(),
        }
    }

    pub fn num_scales(&self) -> usize {
        self.scales.len()
    }

    pub fn num_samples(&self) -> usize {
        self.coefficients.real_part().ncols()
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.coefficients, Coefficients::Complex { .. })
    }

    pub fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    pub fn scales(&self) -> Vec<f64> {
        self.scales.clone()
    }

    /// Real coefficients (the real part for complex results).
    pub fn coefficients(&self) -> Array2<f64> {
        self.coefficients.real_part().clone()
    }

    pub fn real_part(&self) -> Array2<f64> {
        self.coefficients()
    }

    /// Imaginary part, `None` for real results.
    pub fn imaginary_part(&self) -> Option<Array2<f64>> {
        match &self.coefficients {
            Coefficients::Real(_) => None,
            Coefficients::Complex { im, .. } => Some(im.clone()),
        }
    }

    /// Coefficients as complex numbers (zero imaginary part for real results).
    pub fn complex_coefficients(&self) -> Array2<Complex64> {
        match &self.coefficients {
            Coefficients::Real(values) => values.mapv(|v| Complex64::new(v, 0.0)),
            Coefficients::Complex { re, im } => {
                let mut out = Array2::zeros(re.raw_dim());
                Zip::from(&mut out)
                    .and(re)
                    .and(im)
                    .par_for_each(|c, &r, &i| *c = Complex64::new(r, i));
                out
            }
        }
    }

    pub(crate) fn real_view(&self) -> ArrayView2<'_, f64> {
        self.coefficients.real_part().view()
    }

    pub(crate) fn scales_slice(&self) -> &[f64] {
        &self.scales
    }

    fn magnitude_ref(&self) -> &Array2<f64> {
        self.magnitude.get_or_init(|| match &self.coefficients {
            Coefficients::Real(values) => values.mapv(f64::abs),
            Coefficients::Complex { re, im } => map_rows(re, im, simd::magnitude),
        })
    }

    fn power_ref(&self) -> &Array2<f64> {
        self.power.get_or_init(|| match &self.coefficients {
            Coefficients::Real(values) => {
                let mut out = Array2::zeros(values.raw_dim());
                out.axis_iter_mut(Axis(0))
                    .into_par_iter()
                    .zip(values.axis_iter(Axis(0)))
                    .for_each(|(mut dst, src)| {
                        let squared = simd::square(&src.to_vec());
                        dst.iter_mut().zip(squared).for_each(|(d, v)| *d = v);
                    });
                out
            }
            Coefficients::Complex { re, im } => map_rows(re, im, simd::power),
        })
    }

    /// `|W|` for every coefficient.
    pub fn magnitude(&self) -> Array2<f64> {
        self.magnitude_ref().clone()
    }

    /// `atan2(im, re)`; `None` for real results.
    pub fn phase(&self) -> Option<Array2<f64>> {
        self.phase
            .get_or_init(|| match &self.coefficients {
                Coefficients::Real(_) => None,
                Coefficients::Complex { re, im } => {
                    let mut out = Array2::zeros(re.raw_dim());
                    Zip::from(&mut out)
                        .and(re)
                        .and(im)
                        .par_for_each(|p, &r, &i| *p = i.atan2(r));
                    Some(out)
                }
            })
            .clone()
    }

    /// `|W|²` for every coefficient.
    pub fn power_spectrum(&self) -> Array2<f64> {
        self.power_ref().clone()
    }

    /// Mean power over time for each scale (global wavelet spectrum).
    pub fn time_averaged_spectrum(&self) -> Vec<f64> {
        self.time_averaged
            .get_or_init(|| {
                self.power_ref()
                    .mean_axis(Axis(1))
                    .map(|mean| mean.to_vec())
                    .unwrap_or_default()
            })
            .clone()
    }

    /// `f = fc · sampling_rate / scale` for every scale.
    pub fn frequencies(&self, sampling_rate: f64) -> Result<Vec<f64>> {
        ensure_positive("sampling rate", sampling_rate)?;
        Ok(self
            .scales
            .iter()
            .map(|&s| self.center_frequency * sampling_rate / s)
            .collect())
    }

    /// `(min, max)` of [`frequencies`](Self::frequencies).
    pub fn frequency_range(&self, sampling_rate: f64) -> Result<(f64, f64)> {
        let freqs = self.frequencies(sampling_rate)?;
        let min = freqs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = freqs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok((min, max))
    }

    /// Scalogram row: magnitudes at one scale across time.
    pub fn scale_slice(&self, scale_index: usize) -> Result<Vec<f64>> {
        self.check_scale_index(scale_index)?;
        Ok(self.magnitude_ref().row(scale_index).to_vec())
    }

    /// Scalogram column: magnitudes at one time across scales.
    pub fn time_slice(&self, time_index: usize) -> Result<Vec<f64>> {
        self.check_time_index(time_index)?;
        Ok(self.magnitude_ref().column(time_index).to_vec())
    }

    /// Single coefficient; the imaginary part is zero for real results.
    pub fn coefficient(&self, scale_index: usize, time_index: usize) -> Result<Complex64> {
        self.check_scale_index(scale_index)?;
        self.check_time_index(time_index)?;
        Ok(match &self.coefficients {
            Coefficients::Real(values) => Complex64::new(values[[scale_index, time_index]], 0.0),
            Coefficients::Complex { re, im } => Complex64::new(
                re[[scale_index, time_index]],
                im[[scale_index, time_index]],
            ),
        })
    }

    /// Largest magnitude; ties resolve to the first in row-major order.
    pub fn find_max_coefficient(&self) -> MaxCoefficient {
        *self.maximum.get_or_init(|| {
            let magnitude = self.magnitude_ref();
            let mut best = MaxCoefficient {
                scale_index: 0,
                time_index: 0,
                scale: self.scales[0],
                value: magnitude[[0, 0]],
            };
            for ((i, t), &value) in magnitude.indexed_iter() {
                if value > best.value {
                    best = MaxCoefficient {
                        scale_index: i,
                        time_index: t,
                        scale: self.scales[i],
                        value,
                    };
                }
            }
            best
        })
    }

    fn check_scale_index(&self, index: usize) -> Result<()> {
        if index < self.num_scales() {
            Ok(())
        } else {
            Err(CwtError::IndexOutOfRange {
                what: "scale",
                index,
                len: self.num_scales(),
            })
        }
    }

    fn check_time_index(&self, index: usize) -> Result<()> {
        if index < self.num_samples() {
            Ok(())
        } else {
            Err(CwtError::IndexOutOfRange {
                what: "time",
                index,
                len: self.num_samples(),
            })
        }
    }
}

impl PartialEq for CwtResult {
    fn eq(&self, other: &Self) -> bool {
        self.coefficients == other.coefficients
            && self.scales == other.scales
            && self.center_frequency == other.center_frequency
    }
}

fn check_shape(coefficients: &Array2<f64>, scales: &[f64]) -> Result<()> {
    if coefficients.is_empty() {
        return Err(CwtError::EmptyInput("coefficient matrix"));
    }
    validate_scales(scales)?;
    if coefficients.nrows() != scales.len() {
        return Err(CwtError::DimensionMismatch {
            what: "coefficient rows vs scales",
            expected: scales.len(),
            actual: coefficients.nrows(),
        });
    }
    Ok(())
}

fn map_rows(re: &Array2<f64>, im: &Array2<f64>, op: fn(&[f64], &[f64]) -> Vec<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(re.raw_dim());
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(re.axis_iter(Axis(0)).into_par_iter())
        .zip(im.axis_iter(Axis(0)).into_par_iter())
        .for_each(|((mut dst, r), i)| {
            let values = op(&r.to_vec(), &i.to_vec());
            dst.iter_mut().zip(values).for_each(|(d, v)| *d = v);
        });
    out
}
