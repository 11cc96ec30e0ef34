// src/spectral/discrete.rs
//! Reconstruction assisted by an orthogonal discrete transform.
//!
//! Rows whose scale sits close to `2^j` feed level `j` of a DWT (decimated)
//! or MODWT (full length): the row is analysed with the matched filter, only
//! its level-`j` detail is kept, and a per-level gain maps it onto the
//! level. Remaining rows add a small kernel correction.
//!
//! Gains are calibrated against the exact inverse kernel. Row `r`
//! contributes `f_r/√s_r · (a_r ⋆ a_r)` to the exact impulse response, with
//! `a_r` the sampled wavelet and `f_r = w_r/(s_r·√s_r·C)`. A level sees its
//! row through `ã_s * R_j / (2^j·√s)`, `R_j` being the autocorrelation of
//! the level's equivalent synthesis filter. Matched rows, and correction
//! rows rounding to a matched octave, form the target; least squares in the
//! frequency domain then fits one gain per level. The MODWT solves the
//! joint normal equations. Decimated levels are orthogonal once averaged
//! over the decimation phase, so the DWT gains decouple.
//!
//! Measured on 256 samples, 40 scales at 8 per octave from 2 and a sine of
//! period 32 (relative L2 error against the input signal):
//!
//! | wavelet / filter     | exact inverse | MODWT | DWT  |
//! |----------------------|---------------|-------|------|
//! | Morlet / sym8        | 0.11          | 0.020 | 0.33 |
//! | Mexican hat / sym4   | 0.074         | 0.043 | 0.73 |
//!
//! The DWT figures are dominated by aliasing between decimated levels,
//! which a per-level gain cannot cancel. Wavelets with an odd real part
//! have no even component to fit and get zero gains.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use ndarray::ArrayView2;
use num_complex::Complex64;

use crate::dwt::{dwt_multilevel, idwt_multilevel, imodwt, modwt, DwtCoeffs, ModwtCoeffs, WaveletFilter};
use crate::error::{CwtError, Result};
use crate::spectral::cwt::support_length;
use crate::spectral::icwt::{band_rows, sum_rows, InverseCwt};
use crate::spectral::result::CwtResult;
use crate::utils::array::next_power_of_2;
use crate::wavelets::{ContinuousWavelet, WaveletFamily};

/// Relative ridge added to the MODWT normal equations.
const RIDGE: f64 = 1e-12;

/// Output of a discrete-assisted reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteReconstruction {
    pub signal: Vec<f64>,
    /// Filter the inverse ran with.
    pub filter: WaveletFilter,
    /// Nominal resemblance in `(0, 1]` between filter and wavelet.
    pub similarity: f64,
    /// Levels `j` fed from a dyadic row, ascending.
    pub dyadic_levels: Vec<usize>,
    /// Calibrated gain of each entry of `dyadic_levels`.
    pub level_gains: Vec<f64>,
    /// Scales that only entered through the correction term.
    pub correction_scales: Vec<f64>,
}

/// Discrete filter standing in for a continuous wavelet, with its
/// similarity score.
pub fn matched_filter(wavelet: &dyn ContinuousWavelet) -> (WaveletFilter, f64) {
    match wavelet.family() {
        WaveletFamily::Morlet => (WaveletFilter::Sym8, 0.7),
        WaveletFamily::Dog(_) => (WaveletFilter::Sym4, 0.8),
        WaveletFamily::Paul(_) => (WaveletFilter::Sym4, 0.6),
        WaveletFamily::Shannon => (WaveletFilter::Sym8, 0.75),
        WaveletFamily::Unknown => (WaveletFilter::Sym4, 0.5),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscreteKind {
    Dwt,
    Modwt,
}

/// Row-to-level assignment for one reconstruction.
#[derive(Debug, Default)]
struct DyadicPlan {
    /// `(level, row)` pairs, ascending by level.
    levels: Vec<(usize, usize)>,
    corrections: Vec<usize>,
}

/// Level responses and the exact kernel they are fitted to, as half spectra
/// on `m` points.
struct LevelKernels {
    m: usize,
    /// `conj(Â_s)·|Ψ̂_j|² / (2^j·√s)` per level.
    responses: Vec<Vec<Complex64>>,
    /// Phase-averaged energy `Σ|Â_s|²·|Ψ̂_j|² / (s·2^j)` of a decimated level.
    energies: Vec<f64>,
    /// `Σ_r κ_r·f_r/√s_r·|Â_r|²`.
    target: Vec<f64>,
}

impl LevelKernels {
    fn projection(&self, index: usize) -> f64 {
        spectral_sum(self.responses[index].iter().zip(&self.target).map(|(b, e)| b.re * e), self.m)
    }

    fn inner(&self, a: usize, b: usize) -> f64 {
        spectral_sum(
            self.responses[a].iter().zip(&self.responses[b]).map(|(x, y)| (x * y.conj()).re),
            self.m,
        )
    }

    /// Decimated levels: `γ_j = <B_j, E> / N_j`.
    fn dwt_gains(&self) -> Vec<f64> {
        self.energies
            .iter()
            .enumerate()
            .map(|(j, &energy)| if energy > 0.0 { self.projection(j) / energy } else { 0.0 })
            .collect()
    }

    /// Undecimated levels overlap in frequency, so all gains are solved at once.
    fn modwt_gains(&self) -> Vec<f64> {
        let count = self.responses.len();
        let gram = DMatrix::from_fn(count, count, |i, j| self.inner(i, j));
        let rhs = DVector::from_fn(count, |i, _| self.projection(i));
        let ridge = RIDGE * gram.diagonal().max();
        let regular = &gram + DMatrix::identity(count, count) * ridge;
        match regular.cholesky() {
            Some(cholesky) => cholesky.solve(&rhs).iter().copied().collect(),
            None => {
                warn!("level Gram matrix is not positive definite; fitting levels independently");
                (0..count)
                    .map(|i| if gram[(i, i)] > 0.0 { rhs[i] / gram[(i, i)] } else { 0.0 })
                    .collect()
            }
        }
    }
}

/// `(1/m)·Σ` over the full spectrum of a real product, given its half
/// spectrum; interior bins stand for a conjugate pair.
fn spectral_sum(half: impl Iterator<Item = f64>, m: usize) -> f64 {
    let nyquist = m / 2;
    half.enumerate()
        .map(|(k, v)| if k == 0 || k == nyquist { v } else { 2.0 * v })
        .sum::<f64>()
        / m as f64
}

/// `Some(j)` when `|s - 2^j| / 2^j ≤ tolerance` for some `j ≥ 1` with
/// `2^j ≤ n`.
pub fn dyadic_level(scale: f64, n: usize, tolerance: f64) -> Option<usize> {
    let j = scale.log2().round();
    if j < 1.0 {
        return None;
    }
    let power = 2f64.powf(j);
    if power > n as f64 || (scale - power).abs() / power > tolerance {
        return None;
    }
    Some(j as usize)
}

/// Distance in octaves from `scale` to the nearest power of two.
fn octave_distance(scale: f64) -> f64 {
    let l = scale.log2();
    (l - l.round()).abs()
}

impl InverseCwt {
    /// DWT-assisted reconstruction over every scale.
    pub fn reconstruct_dwt(&self, result: &CwtResult) -> Result<DiscreteReconstruction> {
        let rows: Vec<usize> = (0..result.num_scales()).collect();
        self.discrete(result, &rows, DiscreteKind::Dwt)
    }

    /// MODWT-assisted reconstruction over every scale.
    pub fn reconstruct_modwt(&self, result: &CwtResult) -> Result<DiscreteReconstruction> {
        let rows: Vec<usize> = (0..result.num_scales()).collect();
        self.discrete(result, &rows, DiscreteKind::Modwt)
    }

    /// DWT-assisted reconstruction restricted to `[min_scale, max_scale]`.
    ///
    /// # Errors
    /// [`CwtError::NonPositive`] for a bound that is not positive and finite,
    /// [`CwtError::InvalidRange`] when `min_scale > max_scale`.
    pub fn reconstruct_dwt_band(
        &self,
        result: &CwtResult,
        min_scale: f64,
        max_scale: f64,
    ) -> Result<DiscreteReconstruction> {
        let rows = band_rows(result.scales_slice(), min_scale, max_scale)?;
        self.discrete(result, &rows, DiscreteKind::Dwt)
    }

    /// MODWT-assisted reconstruction restricted to `[min_scale, max_scale]`.
    ///
    /// # Errors
    /// As [`reconstruct_dwt_band`](Self::reconstruct_dwt_band).
    pub fn reconstruct_modwt_band(
        &self,
        result: &CwtResult,
        min_scale: f64,
        max_scale: f64,
    ) -> Result<DiscreteReconstruction> {
        let rows = band_rows(result.scales_slice(), min_scale, max_scale)?;
        self.discrete(result, &rows, DiscreteKind::Modwt)
    }

    /// DWT-assisted reconstruction of the band `[min_frequency, max_frequency]`
    /// in Hz, mapped to scales through `s = fc·fs/f`.
    pub fn reconstruct_dwt_frequency_band(
        &self,
        result: &CwtResult,
        min_frequency: f64,
        max_frequency: f64,
        sampling_rate: f64,
    ) -> Result<DiscreteReconstruction> {
        let (min_scale, max_scale) = self.frequency_band_scales(min_frequency, max_frequency, sampling_rate)?;
        self.reconstruct_dwt_band(result, min_scale, max_scale)
    }

    /// MODWT counterpart of
    /// [`reconstruct_dwt_frequency_band`](Self::reconstruct_dwt_frequency_band).
    pub fn reconstruct_modwt_frequency_band(
        &self,
        result: &CwtResult,
        min_frequency: f64,
        max_frequency: f64,
        sampling_rate: f64,
    ) -> Result<DiscreteReconstruction> {
        let (min_scale, max_scale) = self.frequency_band_scales(min_frequency, max_frequency, sampling_rate)?;
        self.reconstruct_modwt_band(result, min_scale, max_scale)
    }

    fn plan(&self, scales: &[f64], rows: &[usize], n: usize) -> DyadicPlan {
        let tolerance = self.config().dyadic_tolerance();
        // Closest row per level wins; others fall back to correction
        let mut best: Vec<(usize, usize, f64)> = Vec::new();
        for &row in rows {
            let scale = scales[row];
            let Some(level) = dyadic_level(scale, n, tolerance) else {
                continue;
            };
            let distance = (scale / 2f64.powi(level as i32) - 1.0).abs();
            match best.iter_mut().find(|(l, _, _)| *l == level) {
                Some(entry) if distance < entry.2 => *entry = (level, row, distance),
                Some(_) => {}
                None => best.push((level, row, distance)),
            }
        }
        best.sort_by_key(|&(level, _, _)| level);

        let used: Vec<usize> = best.iter().map(|&(_, row, _)| row).collect();
        DyadicPlan {
            levels: best.into_iter().map(|(level, row, _)| (level, row)).collect(),
            corrections: rows.iter().copied().filter(|r| !used.contains(r)).collect(),
        }
    }

    /// Spectra of every matched level and of the exact kernel of the rows
    /// sharing their octaves.
    fn level_kernels(&self, scales: &[f64], plan: &DyadicPlan, filter: WaveletFilter) -> Result<LevelKernels> {
        let weight = self.config().correction_weight();
        let matched: Vec<usize> = plan.levels.iter().map(|&(level, _)| level).collect();
        let mut members: Vec<(usize, f64)> = plan.levels.iter().map(|&(_, row)| (row, 1.0)).collect();
        for &row in &plan.corrections {
            let nearest = scales[row].log2().round();
            if nearest >= 1.0 && matched.contains(&(nearest as usize)) {
                members.push((row, 1.0 - weight * (-octave_distance(scales[row])).exp()));
            }
        }

        let bandwidth = self.wavelet().bandwidth();
        let mut widest = 0;
        for &(row, _) in &members {
            widest = widest.max(support_length(scales[row], bandwidth)?);
        }
        let equivalents: Vec<Vec<f64>> = matched.iter().map(|&level| filter.equivalent_detail(level)).collect();
        let longest = equivalents.iter().map(Vec::len).max().unwrap_or(1);
        let m = next_power_of_2(2 * widest + 2 * longest);
        let half = m / 2 + 1;

        let factors = self.row_factors(scales);
        let member_rows: Vec<usize> = members.iter().map(|&(row, _)| row).collect();
        let spectra = self.map_rows(&member_rows, |row| self.taps_spectrum(scales[row], m))?;
        let mut target = vec![0.0; half];
        for (&(row, kappa), spectrum) in members.iter().zip(&spectra) {
            let c = kappa * factors[row] / scales[row].sqrt();
            target.iter_mut().zip(spectrum).for_each(|(t, a)| *t += c * a.norm_sqr());
        }

        let mut responses: Vec<Vec<Complex64>> = Vec::with_capacity(matched.len());
        let mut energies = Vec::with_capacity(matched.len());
        for ((&(level, row), psi), a) in plan.levels.iter().zip(&equivalents).zip(&spectra) {
            let scale = scales[row];
            let mut padded = vec![0.0; m];
            padded[..psi.len()].copy_from_slice(psi);
            let power: Vec<f64> = self
                .spectral_kernel()
                .real_spectrum(&padded)?
                .iter()
                .map(|p| p.norm_sqr())
                .collect();
            let step = (1usize << level) as f64;
            let norm = step * scale.sqrt();
            responses.push(a.iter().zip(&power).map(|(a, p)| a.conj() * (p / norm)).collect());
            energies.push(spectral_sum(
                a.iter().zip(&power).map(|(a, p)| a.norm_sqr() * p / (scale * step)),
                m,
            ));
        }

        Ok(LevelKernels {
            m,
            responses,
            energies,
            target,
        })
    }

    fn discrete(&self, result: &CwtResult, rows: &[usize], kind: DiscreteKind) -> Result<DiscreteReconstruction> {
        if result.is_complex() {
            return Err(CwtError::Unsupported(
                "discrete-assisted reconstruction needs real coefficients".to_string(),
            ));
        }
        let n = result.num_samples();
        let scales = result.scales_slice();
        let coefficients = result.real_view();
        let (filter, similarity) = matched_filter(self.wavelet().as_ref());
        let plan = self.plan(scales, rows, n);

        let gains = if plan.levels.is_empty() {
            Vec::new()
        } else {
            let kernels = self.level_kernels(scales, &plan, filter)?;
            match kind {
                DiscreteKind::Dwt => kernels.dwt_gains(),
                DiscreteKind::Modwt => kernels.modwt_gains(),
            }
        };
        debug!(
            "{kind:?}-assisted reconstruction with {}: levels {:?}, gains {gains:.3?}, {} correction rows",
            filter.name(),
            plan.levels.iter().map(|&(l, _)| l).collect::<Vec<_>>(),
            plan.corrections.len()
        );

        let mut signal = match kind {
            DiscreteKind::Dwt => dwt_proxy(coefficients, &plan, &gains, filter)?,
            DiscreteKind::Modwt => modwt_proxy(coefficients, &plan, &gains, filter)?,
        };

        if !plan.corrections.is_empty() {
            if plan.levels.is_empty() {
                warn!("no dyadic scales matched; reconstruction relies on corrections only");
            }
            let factors = self.row_factors(scales);
            let weight = self.config().correction_weight();
            let contributions = self.map_rows(&plan.corrections, |row| {
                let decay = (-octave_distance(scales[row])).exp();
                let mut out = self.scale_contribution(coefficients.row(row), scales[row], n)?;
                let factor = weight * decay * factors[row];
                out.iter_mut().for_each(|v| *v *= factor);
                Ok(out)
            })?;
            let correction = sum_rows(contributions, n);
            signal.iter_mut().zip(&correction).for_each(|(s, c)| *s += c);
        }

        Ok(DiscreteReconstruction {
            signal,
            filter,
            similarity,
            dyadic_levels: plan.levels.iter().map(|&(level, _)| level).collect(),
            level_gains: gains,
            correction_scales: plan.corrections.iter().map(|&row| scales[row]).collect(),
        })
    }
}

/// Decimated proxy: each matched row is extended periodically to a multiple
/// of `2^top`, analysed down to its level, and only that level's detail is
/// kept; the approximation is zero.
fn dwt_proxy(
    coefficients: ArrayView2<'_, f64>,
    plan: &DyadicPlan,
    gains: &[f64],
    filter: WaveletFilter,
) -> Result<Vec<f64>> {
    let n = coefficients.ncols();
    let Some(&(top, _)) = plan.levels.last() else {
        return Ok(vec![0.0; n]);
    };
    let block = 1usize << top;
    let padded = n.div_ceil(block) * block;

    let mut details: Vec<Vec<f64>> = (1..=top).map(|j| vec![0.0; padded >> j]).collect();
    for (&(level, row), &gain) in plan.levels.iter().zip(gains) {
        let source = coefficients.row(row);
        let extended: Vec<f64> = (0..padded).map(|t| source[t % n]).collect();
        let Some(detail) = dwt_multilevel(&extended, filter, level)?.details.pop() else {
            continue;
        };
        details[level - 1] = detail.into_iter().map(|d| d * gain).collect();
    }

    let coeffs = DwtCoeffs {
        approximation: vec![0.0; padded >> top],
        details,
        filter,
    };
    let mut signal = idwt_multilevel(&coeffs)?;
    signal.truncate(n);
    Ok(signal)
}

/// Undecimated proxy: each matched row keeps its own level-`j` MODWT detail;
/// the smooth part is zero.
fn modwt_proxy(
    coefficients: ArrayView2<'_, f64>,
    plan: &DyadicPlan,
    gains: &[f64],
    filter: WaveletFilter,
) -> Result<Vec<f64>> {
    let n = coefficients.ncols();
    let Some(&(top, _)) = plan.levels.last() else {
        return Ok(vec![0.0; n]);
    };

    let mut details = vec![vec![0.0; n]; top];
    for (&(level, row), &gain) in plan.levels.iter().zip(gains) {
        let source = coefficients.row(row).to_vec();
        let Some(detail) = modwt(&source, filter, level)?.details.pop() else {
            continue;
        };
        details[level - 1] = detail.into_iter().map(|d| d * gain).collect();
    }
    imodwt(&ModwtCoeffs {
        details,
        smooth: vec![0.0; n],
        filter,
    })
}
