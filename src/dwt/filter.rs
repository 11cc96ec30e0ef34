// src/dwt/filter.rs
use std::f64::consts::FRAC_1_SQRT_2;

use crate::error::{CwtError, Result};

/// Orthogonal filters available for discrete-assisted reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaveletFilter {
    Haar,
    /// Daubechies with two vanishing moments (identical to Sym2).
    Db2,
    #[default]
    Sym4,
    Sym8,
}

const HAAR: [f64; 2] = [FRAC_1_SQRT_2, FRAC_1_SQRT_2];

const DB2: [f64; 4] = [
    0.48296291314469025,
    0.83651630373746899,
    0.22414386804185735,
    -0.12940952255092145,
];

const SYM4: [f64; 8] = [
    0.032223100604042702,
    -0.012603967262037833,
    -0.099219543576847216,
    0.29785779560527736,
    0.80373875180591614,
    0.49761866763201545,
    -0.02963552764599851,
    -0.075765714789273325,
];

const SYM8: [f64; 16] = [
    0.0018899503327594609,
    -0.0003029205147213668,
    -0.014952258337048231,
    0.0038087520138906151,
    0.049137179673607506,
    -0.027219029917056003,
    -0.051945838107709037,
    0.3644418948353314,
    0.77718575170052351,
    0.48135965125837221,
    -0.061273359067658524,
    -0.14329423835080971,
    0.0076074873249176054,
    0.031695087811492981,
    -0.00054213233179114812,
    -0.0033824159510061256,
];

impl WaveletFilter {
    pub fn length(self) -> usize {
        self.scaling_coeffs().len()
    }

    /// Low-pass (scaling) coefficients, normalised to `Σg = √2`.
    pub fn scaling_coeffs(self) -> &'static [f64] {
        match self {
            WaveletFilter::Haar => &HAAR,
            WaveletFilter::Db2 => &DB2,
            WaveletFilter::Sym4 => &SYM4,
            WaveletFilter::Sym8 => &SYM8,
        }
    }

    /// High-pass coefficients from the quadrature mirror relation
    /// `h[k] = (-1)^k · g[L-1-k]`.
    pub fn wavelet_coeffs(self) -> Vec<f64> {
        let g = self.scaling_coeffs();
        let len = g.len();
        (0..len)
            .map(|k| if k % 2 == 0 { g[len - 1 - k] } else { -g[len - 1 - k] })
            .collect()
    }

    /// Equivalent synthesis filter `ψ_j` of detail level `level ≥ 1`: one
    /// level-`j` coefficient at index `k` adds `d·ψ_j[t - 2^j·k]` to the
    /// reconstructed signal. Length `(2^j - 1)(L - 1) + 1`.
    pub fn equivalent_detail(self, level: usize) -> Vec<f64> {
        let g = self.scaling_coeffs();
        let mut filter = upsample(&self.wavelet_coeffs(), 1 << level.saturating_sub(1));
        for stage in (0..level.saturating_sub(1)).rev() {
            let stride = 1usize << stage;
            let mut next = vec![0.0; filter.len() + (g.len() - 1) * stride];
            for (i, &f) in filter.iter().enumerate() {
                for (k, &gk) in g.iter().enumerate() {
                    next[i + k * stride] += f * gk;
                }
            }
            filter = next;
        }
        filter
    }

    /// Case-insensitive lookup: `haar`, `db1`, `db2`, `sym2`, `sym4`, `sym8`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "haar" | "db1" => Ok(WaveletFilter::Haar),
            "db2" | "sym2" => Ok(WaveletFilter::Db2),
            "sym4" => Ok(WaveletFilter::Sym4),
            "sym8" => Ok(WaveletFilter::Sym8),
            _ => Err(CwtError::InvalidParameter(format!("unknown discrete filter: {name}"))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WaveletFilter::Haar => "haar",
            WaveletFilter::Db2 => "db2",
            WaveletFilter::Sym4 => "sym4",
            WaveletFilter::Sym8 => "sym8",
        }
    }
}

/// Inserts `factor - 1` zeros between taps.
fn upsample(taps: &[f64], factor: usize) -> Vec<f64> {
    let mut out = vec![0.0; (taps.len() - 1) * factor + 1];
    for (i, &t) in taps.iter().enumerate() {
        out[i * factor] = t;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL: [WaveletFilter; 4] = [
        WaveletFilter::Haar,
        WaveletFilter::Db2,
        WaveletFilter::Sym4,
        WaveletFilter::Sym8,
    ];

    #[test]
    fn test_filters_are_orthonormal() {
        for filter in ALL {
            let g = filter.scaling_coeffs();
            let h = filter.wavelet_coeffs();
            assert_abs_diff_eq!(g.iter().sum::<f64>(), 2f64.sqrt(), epsilon = 1e-10);
            assert_abs_diff_eq!(h.iter().sum::<f64>(), 0.0, epsilon = 1e-10);
            // Even shifts of the low-pass filter are orthonormal
            for shift in (0..g.len()).step_by(2) {
                let dot: f64 = g.iter().zip(&g[shift..]).map(|(a, b)| a * b).sum();
                let expected = if shift == 0 { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(dot, expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(WaveletFilter::from_name("SYM4"), Ok(WaveletFilter::Sym4));
        assert_eq!(WaveletFilter::from_name("sym2"), Ok(WaveletFilter::Db2));
        assert_eq!(WaveletFilter::from_name("haar"), Ok(WaveletFilter::Haar));
        assert!(WaveletFilter::from_name("coif3").is_err());
        assert_eq!(WaveletFilter::default(), WaveletFilter::Sym4);
        for filter in ALL {
            assert_eq!(WaveletFilter::from_name(filter.name()), Ok(filter));
        }
    }

    #[test]
    fn test_equivalent_detail_matches_synthesis() {
        use crate::dwt::{idwt_multilevel, DwtCoeffs};

        for filter in ALL {
            assert_eq!(filter.equivalent_detail(1), filter.wavelet_coeffs());
            for level in 1..=3 {
                let psi = filter.equivalent_detail(level);
                assert_eq!(psi.len(), ((1 << level) - 1) * (filter.length() - 1) + 1);
                // Unit energy, like every synthesis atom of an orthonormal basis
                assert_abs_diff_eq!(psi.iter().map(|v| v * v).sum::<f64>(), 1.0, epsilon = 1e-10);

                // A single detail coefficient synthesizes the filter itself
                let n = 128;
                let mut details: Vec<Vec<f64>> = (1..=level).map(|j| vec![0.0; n >> j]).collect();
                details[level - 1][1] = 1.0;
                let coeffs = DwtCoeffs {
                    approximation: vec![0.0; n >> level],
                    details,
                    filter,
                };
                let signal = idwt_multilevel(&coeffs).unwrap();
                let offset = 1 << level;
                for (t, &v) in signal.iter().enumerate() {
                    let expected = t.checked_sub(offset).and_then(|i| psi.get(i)).copied().unwrap_or(0.0);
                    assert_abs_diff_eq!(v, expected, epsilon = 1e-12);
                }
            }
        }
    }
}
